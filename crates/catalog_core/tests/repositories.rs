use catalog_core::db::migrations::latest_version;
use catalog_core::db::open_db_in_memory;
use catalog_core::{
    Author, AuthorRepository, Book, BookListQuery, BookRepository, ModelValidationError,
    RepoError, SqliteAuthorRepository, SqliteBookRepository, SqliteUserRepository, User,
    UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn genres(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn author_create_get_and_find_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    let author = Author::new("Robert Martin");
    repo.create_author(&author).unwrap();

    assert_eq!(repo.get_author(author.id).unwrap(), Some(author.clone()));
    assert_eq!(
        repo.find_author_by_name("Robert Martin").unwrap(),
        Some(author)
    );
    assert_eq!(repo.find_author_by_name("robert martin").unwrap(), None);
    assert_eq!(repo.get_author(Uuid::new_v4()).unwrap(), None);
}

#[test]
fn find_by_name_returns_earliest_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    let first = Author::new("Twin");
    let second = Author::new("Twin");
    repo.create_author(&first).unwrap();
    repo.create_author(&second).unwrap();

    assert_eq!(repo.count_authors().unwrap(), 2);
    assert_eq!(repo.find_author_by_name("Twin").unwrap().unwrap().id, first.id);
}

#[test]
fn insert_author_if_absent_returns_existing_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    let created = repo.insert_author_if_absent(&Author::new("Sandi Metz")).unwrap();
    let again = repo.insert_author_if_absent(&Author::new("Sandi Metz")).unwrap();

    assert_eq!(created.id, again.id);
    assert_eq!(repo.count_authors().unwrap(), 1);
}

#[test]
fn update_author_born_sets_clears_and_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();
    let author = Author::new("Martin Fowler");
    repo.create_author(&author).unwrap();

    repo.update_author_born(author.id, Some(1963)).unwrap();
    assert_eq!(repo.get_author(author.id).unwrap().unwrap().born, Some(1963));

    repo.update_author_born(author.id, None).unwrap();
    assert_eq!(repo.get_author(author.id).unwrap().unwrap().born, None);

    let missing = Uuid::new_v4();
    let err = repo.update_author_born(missing, Some(1900)).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { table: "authors", id } if id == missing));
}

#[test]
fn blank_author_name_is_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::try_new(&conn).unwrap();

    let err = repo.create_author(&Author::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankAuthorName)
    ));
    assert_eq!(repo.count_authors().unwrap(), 0);
}

#[test]
fn book_genres_keep_order_and_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::try_new(&conn).unwrap();
    let books = SqliteBookRepository::try_new(&conn).unwrap();
    let author = Author::new("Joshua Kerievsky");
    authors.create_author(&author).unwrap();

    let book = Book::new(
        "Refactoring to patterns",
        author.id,
        Some(2008),
        genres(&["refactoring", "patterns", "refactoring"]),
    );
    books.create_book(&book).unwrap();

    let loaded = books.get_book(book.id).unwrap().unwrap();
    assert_eq!(loaded, book);
    assert_eq!(
        loaded.genres,
        genres(&["refactoring", "patterns", "refactoring"])
    );
}

#[test]
fn list_books_applies_author_and_genre_conjunction() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::try_new(&conn).unwrap();
    let books = SqliteBookRepository::try_new(&conn).unwrap();
    let fowler = Author::new("Martin Fowler");
    let beck = Author::new("Kent Beck");
    authors.create_author(&fowler).unwrap();
    authors.create_author(&beck).unwrap();

    let refactoring = Book::new("Refactoring", fowler.id, Some(1999), genres(&["refactoring"]));
    let uml = Book::new("UML Distilled", fowler.id, Some(1997), genres(&["design"]));
    let tdd = Book::new("TDD by Example", beck.id, Some(2002), genres(&["refactoring", "tdd"]));
    for book in [&refactoring, &uml, &tdd] {
        books.create_book(book).unwrap();
    }

    let query = BookListQuery {
        author_id: Some(fowler.id),
        genre: Some("refactoring".to_string()),
    };
    let matched = books.list_books(&query).unwrap();
    assert_eq!(matched, vec![refactoring.clone()]);
    assert_eq!(books.count_books(&query).unwrap(), 1);

    let by_genre = BookListQuery {
        genre: Some("refactoring".to_string()),
        ..BookListQuery::default()
    };
    let ids: Vec<_> = books
        .list_books(&by_genre)
        .unwrap()
        .into_iter()
        .map(|book| book.id)
        .collect();
    assert_eq!(ids, vec![refactoring.id, tdd.id]);

    assert_eq!(books.count_books_by_author(fowler.id).unwrap(), 2);
    assert_eq!(books.count_books(&BookListQuery::default()).unwrap(), 3);
}

#[test]
fn genre_match_is_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::try_new(&conn).unwrap();
    let books = SqliteBookRepository::try_new(&conn).unwrap();
    let author = Author::new("Fyodor Dostoevsky");
    authors.create_author(&author).unwrap();
    books
        .create_book(&Book::new("Crime and punishment", author.id, Some(1866), genres(&["Crime"])))
        .unwrap();

    let lower = BookListQuery {
        genre: Some("crime".to_string()),
        ..BookListQuery::default()
    };
    assert!(books.list_books(&lower).unwrap().is_empty());
}

#[test]
fn list_genres_is_distinct_in_first_seen_order() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::try_new(&conn).unwrap();
    let books = SqliteBookRepository::try_new(&conn).unwrap();
    let author = Author::new("Anyone");
    authors.create_author(&author).unwrap();
    books
        .create_book(&Book::new("One", author.id, None, genres(&["classic", "crime"])))
        .unwrap();
    books
        .create_book(&Book::new("Two", author.id, None, genres(&["design", "classic"])))
        .unwrap();

    assert_eq!(
        books.list_genres().unwrap(),
        genres(&["classic", "crime", "design"])
    );
}

#[test]
fn invalid_book_is_not_persisted() {
    let conn = open_db_in_memory().unwrap();
    let authors = SqliteAuthorRepository::try_new(&conn).unwrap();
    let books = SqliteBookRepository::try_new(&conn).unwrap();
    let author = Author::new("Anyone");
    authors.create_author(&author).unwrap();

    let err = books
        .create_book(&Book::new("", author.id, None, Vec::new()))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::BlankTitle)
    ));
    assert_eq!(books.count_books(&BookListQuery::default()).unwrap(), 0);
}

#[test]
fn usernames_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();

    let user = User::new("mluukkai", "refactoring");
    users.create_user(&user).unwrap();
    assert!(matches!(
        users.create_user(&User::new("mluukkai", "crime")),
        Err(RepoError::Db(_))
    ));

    assert_eq!(users.get_user(user.id).unwrap(), Some(user.clone()));
    assert_eq!(users.find_user_by_username("mluukkai").unwrap(), Some(user));
    assert_eq!(users.find_user_by_username("nobody").unwrap(), None);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteAuthorRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteBookRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("books"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE authors (uuid TEXT PRIMARY KEY NOT NULL, name TEXT NOT NULL);")
        .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteAuthorRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "authors",
            column: "born"
        })
    ));
}
