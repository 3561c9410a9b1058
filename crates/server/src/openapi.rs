use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct NewsDoc {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub author: String,
    #[schema(example = "2026-09-30T12:00:00Z")]
    pub publication_date: String,
    pub first_hand: bool,
    pub created_at: String,
}

#[derive(ToSchema)]
pub struct NewsInputDoc {
    pub title: String,
    pub text: String,
    pub author: String,
    #[schema(example = "2026-09-30T12:00:00Z")]
    pub publication_date: String,
    pub first_hand: bool,
}

#[derive(ToSchema)]
pub struct ListNewsResponseDoc {
    pub data: Vec<NewsDoc>,
    pub page: u32,
    pub order: String,
}

#[derive(ToSchema)]
pub struct ErrorResponseDoc {
    pub error: String,
    pub detail: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::news::list,
        crate::routes::news::get_one,
        crate::routes::news::create,
        crate::routes::news::update,
        crate::routes::news::remove,
    ),
    components(
        schemas(
            HealthResponse,
            NewsDoc,
            NewsInputDoc,
            ListNewsResponseDoc,
            ErrorResponseDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "news")
    )
)]
pub struct ApiDoc;
