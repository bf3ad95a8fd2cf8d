use catalog_core::db::open_db;
use catalog_core::db::open_db_in_memory;
use catalog_core::{
    AddBookRequest, Author, AuthorCreationPolicy, AuthorId, AuthorRepository, CatalogService,
    RepoResult, SqliteAuthorRepository, SqliteBookRepository,
};
use std::cell::Cell;
use std::sync::{Arc, Barrier};
use std::thread;

/// Author store whose first `stale_lookups` name lookups miss, as if a
/// concurrent insert had not been visible yet.
struct StaleNameLookup<R> {
    inner: R,
    stale_lookups: Cell<usize>,
}

impl<R: AuthorRepository> StaleNameLookup<R> {
    fn new(inner: R, stale_lookups: usize) -> Self {
        Self {
            inner,
            stale_lookups: Cell::new(stale_lookups),
        }
    }
}

impl<R: AuthorRepository> AuthorRepository for StaleNameLookup<R> {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId> {
        self.inner.create_author(author)
    }

    fn insert_author_if_absent(&self, author: &Author) -> RepoResult<Author> {
        self.inner.insert_author_if_absent(author)
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        self.inner.get_author(id)
    }

    fn find_author_by_name(&self, name: &str) -> RepoResult<Option<Author>> {
        let remaining = self.stale_lookups.get();
        if remaining > 0 {
            self.stale_lookups.set(remaining - 1);
            return Ok(None);
        }
        self.inner.find_author_by_name(name)
    }

    fn list_authors(&self) -> RepoResult<Vec<Author>> {
        self.inner.list_authors()
    }

    fn update_author_born(&self, id: AuthorId, born: Option<i32>) -> RepoResult<()> {
        self.inner.update_author_born(id, born)
    }

    fn count_authors(&self) -> RepoResult<u64> {
        self.inner.count_authors()
    }
}

fn request(title: &str, author: &str) -> AddBookRequest {
    AddBookRequest {
        title: title.to_string(),
        author: author.to_string(),
        published: None,
        genres: vec!["sci-fi".to_string()],
    }
}

#[test]
fn check_then_insert_duplicates_author_when_lookups_interleave() {
    let conn = open_db_in_memory().unwrap();
    let catalog = CatalogService::new(
        StaleNameLookup::new(SqliteAuthorRepository::try_new(&conn).unwrap(), 2),
        SqliteBookRepository::try_new(&conn).unwrap(),
    );
    assert_eq!(catalog.author_policy(), AuthorCreationPolicy::CheckThenInsert);

    catalog.add_book(request("First", "Y")).unwrap();
    catalog.add_book(request("Second", "Y")).unwrap();

    assert_eq!(catalog.author_count().unwrap(), 2);
    assert_eq!(catalog.book_count().unwrap(), 2);
    // Name lookups resolve to the earliest of the duplicates.
    assert_eq!(catalog.author_book_count("Y").unwrap(), 1);

    catalog.add_book(request("Third", "Y")).unwrap();
    assert_eq!(catalog.author_count().unwrap(), 2);
    assert_eq!(catalog.author_book_count("Y").unwrap(), 2);
}

#[test]
fn insert_if_absent_does_not_depend_on_name_lookups() {
    let conn = open_db_in_memory().unwrap();
    // Every name lookup misses; the atomic path must not consult them.
    let catalog = CatalogService::new(
        StaleNameLookup::new(SqliteAuthorRepository::try_new(&conn).unwrap(), usize::MAX),
        SqliteBookRepository::try_new(&conn).unwrap(),
    )
    .with_author_policy(AuthorCreationPolicy::InsertIfAbsent);

    let first = catalog.add_book(request("First", "Y")).unwrap();
    let second = catalog.add_book(request("Second", "Y")).unwrap();

    assert_eq!(first.author.id, second.author.id);
    assert_eq!(catalog.author_count().unwrap(), 1);

    let authors = catalog.all_authors().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].author.id, first.author.id);
    assert_eq!(authors[0].book_count, 2);
}

#[test]
fn insert_if_absent_reuses_author_created_by_check_then_insert() {
    let conn = open_db_in_memory().unwrap();
    let checked = CatalogService::new(
        SqliteAuthorRepository::try_new(&conn).unwrap(),
        SqliteBookRepository::try_new(&conn).unwrap(),
    );
    let atomic = CatalogService::new(
        SqliteAuthorRepository::try_new(&conn).unwrap(),
        SqliteBookRepository::try_new(&conn).unwrap(),
    )
    .with_author_policy(AuthorCreationPolicy::InsertIfAbsent);

    let first = checked.add_book(request("First", "Ursula")).unwrap();
    let second = atomic.add_book(request("Second", "Ursula")).unwrap();

    assert_eq!(first.author.id, second.author.id);
    assert_eq!(atomic.author_count().unwrap(), 1);
}

#[test]
fn concurrent_add_book_with_insert_if_absent_creates_single_author() {
    const WRITERS: usize = 8;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.sqlite3");
    drop(open_db(&db_path).unwrap());

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let barrier = Arc::clone(&barrier);
            let db_path = db_path.clone();
            thread::spawn(move || {
                let conn = open_db(&db_path).unwrap();
                let catalog = CatalogService::new(
                    SqliteAuthorRepository::try_new(&conn).unwrap(),
                    SqliteBookRepository::try_new(&conn).unwrap(),
                )
                .with_author_policy(AuthorCreationPolicy::InsertIfAbsent);
                barrier.wait();
                catalog
                    .add_book(request(&format!("Book {writer}"), "Brand New Author"))
                    .unwrap()
                    .author
                    .id
            })
        })
        .collect();

    let author_ids: Vec<AuthorId> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    assert!(author_ids.windows(2).all(|pair| pair[0] == pair[1]));

    let conn = open_db(&db_path).unwrap();
    let catalog = CatalogService::new(
        SqliteAuthorRepository::try_new(&conn).unwrap(),
        SqliteBookRepository::try_new(&conn).unwrap(),
    );
    assert_eq!(catalog.author_count().unwrap(), 1);
    assert_eq!(catalog.book_count().unwrap(), WRITERS as u64);
    assert_eq!(
        catalog.author_book_count("Brand New Author").unwrap(),
        WRITERS as u64
    );
}
