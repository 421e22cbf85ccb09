//! Graph query layer: every user, book and relationship operation expressed
//! as a store request plus materialization of its rows.

use crate::cache::UserLookup;
use crate::materialize;
use crate::query::{field_list, pair_projection, Direction, EdgeTraversal, GraphQuery, QueryBuilder};
use crate::schema::{self, BOOK_FIELDS, USER_FIELDS};
use crate::store::GraphStore;
use async_trait::async_trait;
use bookgraph_core::error::{BookgraphError, Result};
use bookgraph_core::id::{BookId, UserId};
use bookgraph_core::types::{
    Book, BookDetails, BorrowedBook, FollowingRelation, OwnedBook, OwnershipStatus, RelationKind,
    User, UserProfile,
};
use chrono::Utc;
use tracing::{debug, info};

/// Create a user node
pub const CREATE_USER: &str = r#"
    CREATE users SET
        uid = $uid, name = $name, email = $email,
        location = $location, external_id = $external_id
    RETURN uid, name, email, location, external_id
"#;

/// Overwrite the mutable attributes of a user
pub const UPDATE_USER: &str = r#"
    UPDATE users SET
        name = $name, email = $email,
        location = $location, external_id = $external_id
    WHERE uid = $uid
    RETURN uid, name, email, location, external_id
"#;

/// Create a book node
pub const CREATE_BOOK: &str = r#"
    CREATE books SET bid = $bid, title = $title, author = $author, isbn = $isbn
    RETURN bid, title, author, isbn
"#;

/// Create a Following edge. Nothing is created when either user is missing.
pub const RELATE_FOLLOWING: &str = r#"
    LET $from = (SELECT VALUE id FROM users WHERE uid = $follower);
    LET $to = (SELECT VALUE id FROM users WHERE uid = $followee);
    LET $edges = (RELATE $from->following->$to SET created_at = $created_at);
    SELECT in.uid AS follower, out.uid AS followee, created_at FROM $edges
"#;

/// Create an Owns edge under its pair id, so a second edge for the same
/// (user, book) pair is rejected as a duplicate record.
pub const RELATE_OWNS: &str = r#"
    LET $from = (SELECT VALUE id FROM users WHERE uid = $user_id);
    LET $to = (SELECT VALUE id FROM books WHERE bid = $book_id);
    LET $edge = type::thing('owns', [$user_id, $book_id]);
    LET $edges = (RELATE $from->$edge->$to SET status = $status, since = $since)
"#;

/// Change the status of an existing Owns edge in place
pub const UPDATE_OWNS_STATUS: &str = r#"
    LET $edges = (UPDATE owns SET status = $status WHERE in.uid = $user_id AND out.bid = $book_id)
"#;

/// Create a Borrowed edge
pub const RELATE_BORROWED: &str = r#"
    LET $from = (SELECT VALUE id FROM users WHERE uid = $user_id);
    LET $to = (SELECT VALUE id FROM books WHERE bid = $book_id);
    LET $edges = (RELATE $from->borrowed->$to SET owner_uid = $owner_id, borrowed_at = $borrowed_at)
"#;

/// `{ node, edge }` rows for the edges held in `$edges`
fn select_edges(kind: RelationKind) -> GraphQuery {
    GraphQuery::new(
        QueryBuilder::new()
            .select(
                &pair_projection(kind, Direction::Outgoing, BOOK_FIELDS),
                "$edges",
            )
            .build(),
    )
}

/// The user echoed by an update of `id`
pub fn updated_user(rows: Vec<serde_json::Value>, id: &UserId) -> Result<User> {
    let row = materialize::expect_single(rows, "user", id.as_str())?;
    materialize::user_from_node(&materialize::properties(row)?)
}

fn validate_profile(profile: &UserProfile) -> Result<()> {
    if profile.name.trim().is_empty() {
        return Err(BookgraphError::invalid_input("User name cannot be empty"));
    }
    if profile.email.trim().is_empty() {
        return Err(BookgraphError::invalid_input("User email cannot be empty"));
    }
    Ok(())
}

fn validate_book(details: &BookDetails) -> Result<()> {
    if details.title.trim().is_empty() {
        return Err(BookgraphError::invalid_input("Book title cannot be empty"));
    }
    if details.author.trim().is_empty() {
        return Err(BookgraphError::invalid_input("Book author cannot be empty"));
    }
    Ok(())
}

/// Users, books and relationships over a [`GraphStore`].
///
/// Each method issues one store request (two for borrowing, which checks the
/// owner first). Lookups by id are uncached here; see
/// [`crate::repository::GraphRepository`] for the cached façade.
pub struct GraphQueries<S> {
    store: S,
}

impl<S: GraphStore> GraphQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- users ----

    /// Persist a new user under a freshly generated id
    pub async fn create_user(&self, profile: UserProfile) -> Result<User> {
        validate_profile(&profile)?;
        let id = UserId::generate();

        let query = GraphQuery::new(CREATE_USER)
            .bind("uid", id.as_str())
            .bind("name", profile.name)
            .bind("email", profile.email)
            .bind("location", profile.location)
            .bind("external_id", profile.external_id);

        let rows = self.store.write(&query).await?;
        let row = materialize::expect_single(rows, "user", id.as_str())?;
        let user = materialize::user_from_node(&materialize::properties(row)?)?;

        info!(user_id = %user.id(), "Created user");
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &UserId) -> Result<User> {
        self.find_user(schema::USER_KEY, id.as_str()).await
    }

    /// Look a user up by their third-party social id
    pub async fn get_user_by_external_id(&self, external_id: &str) -> Result<User> {
        self.find_user("external_id", external_id).await
    }

    async fn find_user(&self, key: &str, value: &str) -> Result<User> {
        let text = QueryBuilder::new()
            .select(&field_list(USER_FIELDS), schema::USER_TABLE)
            .where_clause(&format!("{} = $value", key))
            .build();

        let rows = self.store.read(&GraphQuery::new(text).bind("value", value)).await?;
        let row = materialize::expect_single(rows, "user", value)?;
        materialize::user_from_node(&materialize::properties(row)?)
    }

    /// Overwrite every mutable attribute of the user with `id`
    pub async fn update_user(&self, id: &UserId, profile: UserProfile) -> Result<User> {
        let rows = self.write_user_update(id, profile).await?;
        updated_user(rows, id)
    }

    /// Run the update and return the rows it echoed, unconverted. Any row
    /// means the write committed.
    pub async fn write_user_update(
        &self,
        id: &UserId,
        profile: UserProfile,
    ) -> Result<Vec<serde_json::Value>> {
        validate_profile(&profile)?;

        let query = GraphQuery::new(UPDATE_USER)
            .bind("uid", id.as_str())
            .bind("name", profile.name)
            .bind("email", profile.email)
            .bind("location", profile.location)
            .bind("external_id", profile.external_id);

        let rows = self.store.write(&query).await?;
        debug!(user_id = %id, rows = rows.len(), "Updated user");
        Ok(rows)
    }

    // ---- following ----

    /// Record that `follower` follows `followee`. Calling twice creates two
    /// edges; use [`Self::is_following`] for follow-once semantics.
    pub async fn create_following_relation(
        &self,
        follower: &UserId,
        followee: &UserId,
    ) -> Result<FollowingRelation> {
        let query = GraphQuery::new(RELATE_FOLLOWING)
            .bind("follower", follower.as_str())
            .bind("followee", followee.as_str())
            .bind("created_at", Utc::now().to_rfc3339());

        let rows = self.store.write(&query).await?;
        let row = materialize::expect_single(
            rows,
            "user",
            &format!("{} or {}", follower, followee),
        )?;
        let relation = materialize::following_from_row(&materialize::properties(row)?)?;

        debug!(follower = %follower, followee = %followee, "Created following relation");
        Ok(relation)
    }

    pub async fn is_following(&self, follower: &UserId, followee: &UserId) -> Result<bool> {
        let query = EdgeTraversal::outgoing(RelationKind::Following, follower.as_str())
            .nodes(&["uid"])
            .filter("out.uid", followee.as_str())
            .build();

        Ok(!self.store.read(&query).await?.is_empty())
    }

    /// Users following `id`
    pub async fn get_followers(&self, id: &UserId) -> Result<Vec<User>> {
        let query = EdgeTraversal::incoming(RelationKind::Following, id.as_str()).build();
        materialize::users(self.store.read(&query).await?)
    }

    /// Users `id` follows
    pub async fn get_following(&self, id: &UserId) -> Result<Vec<User>> {
        let query = EdgeTraversal::outgoing(RelationKind::Following, id.as_str()).build();
        materialize::users(self.store.read(&query).await?)
    }

    // ---- books ----

    pub async fn create_book(&self, details: BookDetails) -> Result<Book> {
        validate_book(&details)?;
        let id = BookId::generate();

        let query = GraphQuery::new(CREATE_BOOK)
            .bind("bid", id.as_str())
            .bind("title", details.title)
            .bind("author", details.author)
            .bind("isbn", details.isbn);

        let rows = self.store.write(&query).await?;
        let row = materialize::expect_single(rows, "book", id.as_str())?;
        let book = materialize::book_from_node(&materialize::properties(row)?)?;

        info!(book_id = %book.id(), "Created book");
        Ok(book)
    }

    pub async fn get_book_by_id(&self, id: &BookId) -> Result<Book> {
        let text = QueryBuilder::new()
            .select(&field_list(BOOK_FIELDS), schema::BOOK_TABLE)
            .where_clause(&format!("{} = $value", schema::BOOK_KEY))
            .build();

        let rows = self
            .store
            .read(&GraphQuery::new(text).bind("value", id.as_str()))
            .await?;
        let row = materialize::expect_single(rows, "book", id.as_str())?;
        materialize::book_from_node(&materialize::properties(row)?)
    }

    // ---- ownership ----

    /// Every book the user owns, whatever its status
    pub async fn get_owned_books(&self, user_id: &UserId) -> Result<Vec<OwnedBook>> {
        self.owned_books_with(user_id, None).await
    }

    pub async fn get_available_books(&self, user_id: &UserId) -> Result<Vec<OwnedBook>> {
        self.owned_books_with(user_id, Some(OwnershipStatus::Available))
            .await
    }

    pub async fn get_lent_books(&self, user_id: &UserId) -> Result<Vec<OwnedBook>> {
        self.owned_books_with(user_id, Some(OwnershipStatus::Lent))
            .await
    }

    async fn owned_books_with(
        &self,
        user_id: &UserId,
        status: Option<OwnershipStatus>,
    ) -> Result<Vec<OwnedBook>> {
        let mut traversal = EdgeTraversal::outgoing(RelationKind::Owns, user_id.as_str())
            .nodes(BOOK_FIELDS)
            .with_edge();
        if let Some(status) = status {
            traversal = traversal.filter("status", status.as_str());
        }

        materialize::owned_books(self.store.read(&traversal.build()).await?)
    }

    /// Record that the user owns the book
    pub async fn add_owned_book(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        status: OwnershipStatus,
    ) -> Result<OwnedBook> {
        let query = GraphQuery::new(RELATE_OWNS)
            .bind("user_id", user_id.as_str())
            .bind("book_id", book_id.as_str())
            .bind("status", status.as_str())
            .bind("since", Utc::now().to_rfc3339())
            .then(select_edges(RelationKind::Owns));

        let owned = self.single_owned(query, user_id, book_id).await?;
        info!(user_id = %user_id, book_id = %book_id, status = %status, "Added owned book");
        Ok(owned)
    }

    /// Move an existing Owns edge to `status`
    pub async fn update_ownership_status(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        status: OwnershipStatus,
    ) -> Result<OwnedBook> {
        let query = GraphQuery::new(UPDATE_OWNS_STATUS)
            .bind("user_id", user_id.as_str())
            .bind("book_id", book_id.as_str())
            .bind("status", status.as_str())
            .then(select_edges(RelationKind::Owns));

        let owned = self.single_owned(query, user_id, book_id).await?;
        debug!(user_id = %user_id, book_id = %book_id, status = %status, "Updated ownership status");
        Ok(owned)
    }

    async fn single_owned(
        &self,
        query: GraphQuery,
        user_id: &UserId,
        book_id: &BookId,
    ) -> Result<OwnedBook> {
        let rows = self.store.write(&query).await?;
        let id = format!("{}->{}", user_id, book_id);
        let row = materialize::expect_single(rows, "ownership", &id)?;
        let mut books = materialize::owned_books(vec![row])?;
        books
            .pop()
            .ok_or_else(|| BookgraphError::internal("Ownership row vanished during conversion"))
    }

    // ---- borrowing ----

    /// Books the user currently holds without owning them
    pub async fn get_borrowed_books(&self, user_id: &UserId) -> Result<Vec<BorrowedBook>> {
        let query = EdgeTraversal::outgoing(RelationKind::Borrowed, user_id.as_str())
            .nodes(BOOK_FIELDS)
            .with_edge()
            .build();

        materialize::borrowed_books(self.store.read(&query).await?)
    }

    /// Record that `borrower` holds `owner`'s copy of the book
    pub async fn add_borrowed_book(
        &self,
        borrower: &UserId,
        book_id: &BookId,
        owner: &UserId,
    ) -> Result<BorrowedBook> {
        if borrower == owner {
            return Err(BookgraphError::invalid_input(format!(
                "User '{}' cannot borrow their own book",
                borrower
            )));
        }
        self.get_user_by_id(owner).await?;

        let query = GraphQuery::new(RELATE_BORROWED)
            .bind("user_id", borrower.as_str())
            .bind("book_id", book_id.as_str())
            .bind("owner_id", owner.as_str())
            .bind("borrowed_at", Utc::now().to_rfc3339())
            .then(select_edges(RelationKind::Borrowed));

        let rows = self.store.write(&query).await?;
        let row = materialize::expect_single(rows, "borrow", &format!("{}->{}", borrower, book_id))?;
        let mut books = materialize::borrowed_books(vec![row])?;
        let borrowed = books
            .pop()
            .ok_or_else(|| BookgraphError::internal("Borrow row vanished during conversion"))?;

        info!(borrower = %borrower, book_id = %book_id, owner = %owner, "Added borrowed book");
        Ok(borrowed)
    }
}

#[async_trait]
impl<S: GraphStore> UserLookup for GraphQueries<S> {
    async fn lookup_user(&self, id: &UserId) -> Result<User> {
        self.get_user_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockGraphStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_lookup_binds_id_and_materializes() {
        let mut store = MockGraphStore::new();
        store
            .expect_read()
            .withf(|query| {
                query.text() == "SELECT uid, name, email, location, external_id FROM users WHERE uid = $value"
                    && query.param("value") == Some(&json!("u1"))
            })
            .times(1)
            .returning(|_| {
                Ok(vec![json!({ "uid": "u1", "name": "Ann", "email": "ann@example.com" })])
            });

        let user = GraphQueries::new(store)
            .get_user_by_id(&UserId::from("u1"))
            .await
            .unwrap();
        assert_eq!(user.name(), "Ann");
        assert_eq!(user.profile().location, None);
    }

    #[tokio::test]
    async fn test_duplicate_rows_are_integrity_violation() {
        let mut store = MockGraphStore::new();
        store.expect_read().returning(|_| {
            let row = json!({ "uid": "u1", "name": "Ann", "email": "ann@example.com" });
            Ok(vec![row.clone(), row])
        });

        let err = GraphQueries::new(store)
            .get_user_by_external_id("fb-1")
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[tokio::test]
    async fn test_status_filter_reaches_the_store() {
        let mut store = MockGraphStore::new();
        store
            .expect_read()
            .withf(|query| {
                query.text().contains("status = $filter_0")
                    && query.param("filter_0") == Some(&json!("lent"))
            })
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let books = GraphQueries::new(store)
            .get_lent_books(&UserId::from("u1"))
            .await
            .unwrap();
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let mut store = MockGraphStore::new();
        store
            .expect_write()
            .returning(|_| Err(BookgraphError::store_write("disk full")));

        let err = GraphQueries::new(store)
            .create_user(UserProfile::new("Ann", "ann@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookgraphError::StoreWrite(_)));
    }

    #[tokio::test]
    async fn test_blank_profile_is_rejected_before_the_store() {
        let store = MockGraphStore::new();
        let err = GraphQueries::new(store)
            .create_user(UserProfile::new("  ", "ann@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookgraphError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_borrowing_own_book_is_rejected() {
        let store = MockGraphStore::new();
        let id = UserId::from("u1");
        let err = GraphQueries::new(store)
            .add_borrowed_book(&id, &BookId::from("b1"), &id)
            .await
            .unwrap_err();
        assert!(matches!(err, BookgraphError::InvalidInput(_)));
    }

    #[test]
    fn test_select_edges_reads_from_bound_edges() {
        let query = select_edges(RelationKind::Owns);
        assert!(query.text().starts_with("SELECT { bid: out.bid"));
        assert!(query.text().ends_with("FROM $edges"));
    }
}
