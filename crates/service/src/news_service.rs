use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::pagination::Pagination;
use models::news::{self, Entity as NewsEntity};

use crate::errors::ServiceError;

/// Fixed page size for news listings.
pub const PAGE_SIZE: u32 = 10;

/// Proposed article data for create and full-replace update.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsInput {
    pub title: String,
    pub text: String,
    pub author: String,
    pub publication_date: DateTime<Utc>,
    #[serde(default)]
    pub first_hand: bool,
}

/// Listing sort direction over publication_date. Unknown inputs fall back to
/// descending, the default a client gets without any query string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl From<SortOrder> for Order {
    fn from(o: SortOrder) -> Self {
        match o {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// List news ordered by publication date, optionally filtered by a
/// case-insensitive title substring. Page size is fixed at [`PAGE_SIZE`].
pub async fn list_news(
    db: &DatabaseConnection,
    page: u32,
    order: SortOrder,
    title: Option<&str>,
) -> Result<Vec<news::Model>, ServiceError> {
    let mut finder = NewsEntity::find();
    if let Some(t) = title.filter(|t| !t.trim().is_empty()) {
        finder = finder.filter(Expr::col(news::Column::Title).ilike(format!("%{}%", escape_like(t))));
    }
    let (page_idx, per_page) = Pagination { page, per_page: PAGE_SIZE }.normalize();
    let rows = finder
        .order_by(news::Column::PublicationDate, order.into())
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(rows)
}

/// Get a news article by id.
pub async fn get_news(db: &DatabaseConnection, id: i32) -> Result<news::Model, ServiceError> {
    NewsEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("news"))
}

/// Create a news article after validation. `now` is the clock reading the
/// publication date is validated against.
pub async fn create_news(
    db: &DatabaseConnection,
    input: NewsInput,
    now: DateTime<Utc>,
) -> Result<news::Model, ServiceError> {
    validate_news(db, &input, true, now).await?;

    let am = news::ActiveModel {
        title: Set(input.title),
        text: Set(input.text),
        author: Set(input.author),
        publication_date: Set(input.publication_date.into()),
        first_hand: Set(input.first_hand),
        created_at: Set(now.into()),
        ..Default::default()
    };
    let created = am.insert(db).await.map_err(map_write_err)?;
    info!(id = created.id, title = %created.title, "created news");
    Ok(created)
}

/// Full-replace update of a news article. The title uniqueness check only runs
/// when the title actually changed, so updating an article with its own title
/// never conflicts with itself.
pub async fn update_news(
    db: &DatabaseConnection,
    id: i32,
    input: NewsInput,
    now: DateTime<Utc>,
) -> Result<news::Model, ServiceError> {
    let current = get_news(db, id).await?;
    let title_changed = current.title != input.title;
    validate_news(db, &input, title_changed, now).await?;

    let mut am: news::ActiveModel = current.into();
    am.title = Set(input.title);
    am.text = Set(input.text);
    am.author = Set(input.author);
    am.publication_date = Set(input.publication_date.into());
    am.first_hand = Set(input.first_hand);
    let updated = am.update(db).await.map_err(map_write_err)?;
    info!(id = updated.id, "updated news");
    Ok(updated)
}

/// Delete a news article; existence is confirmed first.
pub async fn delete_news(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    get_news(db, id).await?;
    NewsEntity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(id, "deleted news");
    Ok(())
}

/// LIKE treats `%`, `_` and the escape character as pattern syntax; the title
/// filter is a literal substring match, so escape them in user input.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Sequential checks, short-circuiting on the first failure. Uniqueness runs
/// first so a duplicate title reports a conflict even when other fields are
/// also invalid.
async fn validate_news(
    db: &DatabaseConnection,
    input: &NewsInput,
    check_title: bool,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if check_title {
        let existing = NewsEntity::find()
            .filter(news::Column::Title.eq(&input.title))
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "news with title {:?} already exists",
                input.title
            )));
        }
    }
    news::validate_text(&input.text)?;
    news::validate_publication_date(input.publication_date, now)?;
    Ok(())
}

/// The pre-check above races with concurrent writers; the unique constraint on
/// title is the authoritative guard, so map its violation to a conflict too.
fn map_write_err(e: DbErr) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict("news title already exists".into())
        }
        _ => ServiceError::Db(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use chrono::Duration;
    use uuid::Uuid;

    fn long_text() -> String {
        "all work and no play makes jack a dull boy. ".repeat(12)
    }

    fn input(title: &str) -> NewsInput {
        NewsInput {
            title: title.to_string(),
            text: long_text(),
            author: "John Doe".into(),
            publication_date: Utc::now() + Duration::days(30),
            first_hand: false,
        }
    }

    fn unique_title(prefix: &str) -> String {
        format!("{} {}", prefix, Uuid::new_v4())
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain title"), "plain title");
    }

    #[test]
    fn sort_order_parses_asc_and_falls_back_to_desc() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }

    #[tokio::test]
    async fn news_crud_round_trip() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let title = unique_title("crud");
        let created = create_news(&db, input(&title), Utc::now()).await?;
        assert!(created.id > 0);
        assert_eq!(created.title, title);

        let fetched = get_news(&db, created.id).await?;
        assert_eq!(fetched, created);

        let new_title = unique_title("crud-renamed");
        let updated = update_news(&db, created.id, input(&new_title), Utc::now()).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, new_title);
        assert_eq!(updated.created_at, created.created_at);

        delete_news(&db, created.id).await?;
        let gone = get_news(&db, created.id).await;
        assert!(matches!(gone, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_title_conflicts() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let title = unique_title("dup");
        let first = create_news(&db, input(&title), Utc::now()).await?;
        let second = create_news(&db, input(&title), Utc::now()).await;
        assert!(matches!(second, Err(ServiceError::Conflict(_))));

        delete_news(&db, first.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn update_to_existing_title_conflicts_but_own_title_passes() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let title_a = unique_title("own-a");
        let title_b = unique_title("own-b");
        let a = create_news(&db, input(&title_a), Utc::now()).await?;
        let b = create_news(&db, input(&title_b), Utc::now()).await?;

        // keeping the same title must not trip the uniqueness check
        let kept = update_news(&db, a.id, input(&title_a), Utc::now()).await?;
        assert_eq!(kept.title, title_a);

        let stolen = update_news(&db, a.id, input(&title_b), Utc::now()).await;
        assert!(matches!(stolen, Err(ServiceError::Conflict(_))));

        delete_news(&db, a.id).await?;
        delete_news(&db, b.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn short_text_and_past_date_are_rejected() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let mut short = input(&unique_title("short"));
        short.text = "too short".into();
        let res = create_news(&db, short, Utc::now()).await;
        assert!(matches!(res, Err(ServiceError::Model(_))));

        let mut past = input(&unique_title("past"));
        past.publication_date = Utc::now() - Duration::days(1);
        let res = create_news(&db, past, Utc::now()).await;
        assert!(matches!(res, Err(ServiceError::Model(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_orders_and_paginates() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let marker = format!("Marker{}", Uuid::new_v4().simple());
        let mut created = Vec::new();
        for i in 0..12 {
            let mut item = input(&format!("{} item {}", marker, i));
            item.publication_date = Utc::now() + Duration::days(30 + i);
            created.push(create_news(&db, item, Utc::now()).await?);
        }

        // filter is a case-insensitive substring match
        let page1 = list_news(&db, 1, SortOrder::Asc, Some(&marker.to_lowercase())).await?;
        assert_eq!(page1.len() as u32, PAGE_SIZE);
        assert!(page1.iter().all(|n| n.title.contains(&marker)));
        let mut dates: Vec<_> = page1.iter().map(|n| n.publication_date).collect();
        let sorted = {
            let mut d = dates.clone();
            d.sort();
            d
        };
        assert_eq!(dates, sorted);

        let page2 = list_news(&db, 2, SortOrder::Asc, Some(&marker)).await?;
        assert_eq!(page2.len(), 2);

        let desc = list_news(&db, 1, SortOrder::Desc, Some(&marker)).await?;
        dates = desc.iter().map(|n| n.publication_date).collect();
        let mut rev = dates.clone();
        rev.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, rev);

        let none = list_news(&db, 1, SortOrder::Desc, Some("NoSuchTitleAnywhere")).await?;
        assert!(none.is_empty());

        for n in created {
            delete_news(&db, n.id).await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn filter_matches_like_metacharacters_literally() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let marker = format!("Lit{}", Uuid::new_v4().simple());
        let percent = create_news(&db, input(&format!("Sale 100% off {}", marker)), Utc::now()).await?;
        let plain = create_news(&db, input(&format!("Sale 100 plus off {}", marker)), Utc::now()).await?;

        // an unescaped "100% off" would wildcard-match both titles
        let hits = list_news(&db, 1, SortOrder::Desc, Some("100% off")).await?;
        assert!(hits.iter().any(|n| n.id == percent.id));
        assert!(hits.iter().all(|n| n.id != plain.id));

        // "_" is a single-character wildcard unless escaped
        let underscore = list_news(&db, 1, SortOrder::Desc, Some(&format!("_{}", marker))).await?;
        assert!(underscore.is_empty());

        delete_news(&db, percent.id).await?;
        delete_news(&db, plain.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn storage_constraint_backstops_the_uniqueness_precheck() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match get_db().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };

        let title = unique_title("race");
        let first = create_news(&db, input(&title), Utc::now()).await?;

        // Simulate a writer that passed a stale pre-check: insert directly,
        // bypassing validation. The unique constraint must still reject it.
        let am = news::ActiveModel {
            title: Set(title.clone()),
            text: Set(long_text()),
            author: Set("Jane Doe".into()),
            publication_date: Set(Utc::now().into()),
            first_hand: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let raced = am.insert(&db).await;
        match raced {
            Err(e) => assert!(matches!(
                e.sql_err(),
                Some(SqlErr::UniqueConstraintViolation(_))
            )),
            Ok(m) => panic!("duplicate title was accepted: id {}", m.id),
        }

        delete_news(&db, first.id).await?;
        Ok(())
    }
}
