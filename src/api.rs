use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod state;

pub use state::App;

pub fn router(app: App) -> Router {
    Router::new()
        .route("/courses/:course_id", get(courses::detail))
        .route("/courses/:course_id/enroll", post(courses::enroll))
        .route("/courses/:course_id/lessons", get(courses::lessons))
        .route("/courses/:course_id/enrollments", get(courses::enrollments))
        .route("/courses/:course_id/lessons/:lesson_id/access", get(courses::access))
        .route("/lessons/:lesson_id", get(lessons::view))
        .route("/lessons/:lesson_id/complete", post(lessons::complete))
        .route("/enrollments", get(enrollments::mine))
        .route("/enrollments/stats", get(enrollments::stats))
        .route("/enrollments/:id", get(enrollments::details))
        .route("/enrollments/:id/lessons", post(enrollments::complete_lesson))
        .route("/enrollments/:id/progress/refresh", post(enrollments::refresh_progress))
        .route("/enrollments/:id/progress", put(enrollments::record_progress))
        .route("/enrollments/:id/notes", post(enrollments::add_note))
        .route("/enrollments/:id/drop", post(enrollments::drop))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}

pub mod courses {
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::Json;
    use serde::Serialize;
    use tracing::instrument;

    use super::extract::{Authenticated, Caller};
    use super::App;
    use crate::database::Record;
    use crate::model::{Course, Enrollment, Lesson};
    use crate::service::commands::PageQuery;
    use crate::service::{CourseDetail, LessonListing, Page, ServiceError};

    #[instrument(skip(app))]
    pub async fn detail(
        State(app): State<App>,
        caller: Caller,
        Path(course_id): Path<String>,
    ) -> Result<Json<CourseDetail>, ServiceError> {
        let course = Record::<Course>::new(course_id);
        Ok(Json(app.course_detail(caller.principal(), &course).await?))
    }

    #[instrument(skip(app))]
    pub async fn enroll(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(course_id): Path<String>,
    ) -> Result<(StatusCode, Json<Enrollment>), ServiceError> {
        let course = Record::<Course>::new(course_id);
        let enrollment = app.enroll(&principal, &course).await?;

        Ok((StatusCode::CREATED, Json(enrollment)))
    }

    #[instrument(skip(app))]
    pub async fn lessons(
        State(app): State<App>,
        caller: Caller,
        Path(course_id): Path<String>,
    ) -> Result<Json<LessonListing>, ServiceError> {
        let course = Record::<Course>::new(course_id);
        Ok(Json(app.course_lessons(caller.principal(), &course).await?))
    }

    #[instrument(skip(app))]
    pub async fn enrollments(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(course_id): Path<String>,
        Query(query): Query<PageQuery>,
    ) -> Result<Json<Page<Enrollment>>, ServiceError> {
        let course = Record::<Course>::new(course_id);
        Ok(Json(app.course_enrollments(&principal, &course, &query).await?))
    }

    #[derive(Debug, Serialize)]
    pub struct Access {
        pub has_access: bool,
    }

    #[instrument(skip(app))]
    pub async fn access(
        State(app): State<App>,
        caller: Caller,
        Path((course_id, lesson_id)): Path<(String, String)>,
    ) -> Result<Json<Access>, ServiceError> {
        let course = Record::<Course>::new(course_id);
        let lesson = Record::<Lesson>::new(lesson_id);
        let has_access = app.can_access_lesson(caller.principal(), &course, &lesson).await?;

        Ok(Json(Access { has_access }))
    }
}

pub mod lessons {
    use axum::extract::{Path, State};
    use axum::Json;
    use tracing::instrument;

    use super::extract::{Authenticated, Caller};
    use super::App;
    use crate::database::Record;
    use crate::model::Lesson;
    use crate::service::commands::LessonProgress;
    use crate::service::{LessonView, ProgressSummary, ServiceError};

    #[instrument(skip(app))]
    pub async fn view(
        State(app): State<App>,
        caller: Caller,
        Path(lesson_id): Path<String>,
    ) -> Result<Json<LessonView>, ServiceError> {
        let lesson = Record::<Lesson>::new(lesson_id);
        Ok(Json(app.view_lesson(caller.principal(), &lesson).await?))
    }

    /// The body is optional, a bare POST completes the lesson without score or time.
    #[instrument(skip(app))]
    pub async fn complete(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(lesson_id): Path<String>,
        body: Option<Json<LessonProgress>>,
    ) -> Result<Json<ProgressSummary>, ServiceError> {
        let lesson = Record::<Lesson>::new(lesson_id);
        let progress = body.map(|Json(progress)| progress).unwrap_or_default();

        Ok(Json(app.mark_lesson_completed(&principal, &lesson, &progress).await?))
    }
}

pub mod enrollments {
    use axum::extract::{Path, Query, State};
    use axum::Json;
    use tracing::instrument;

    use super::extract::Authenticated;
    use super::App;
    use crate::database::Record;
    use crate::model::Enrollment;
    use crate::service::commands::{CompleteLessonCommand, NoteCommand, PageQuery};
    use crate::service::{EnrollmentStats, Page, ProgressSummary, ServiceError};

    #[instrument(skip(app))]
    pub async fn mine(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Query(query): Query<PageQuery>,
    ) -> Result<Json<Page<Enrollment>>, ServiceError> {
        Ok(Json(app.list_for_student(&principal, &query).await?))
    }

    #[instrument(skip(app))]
    pub async fn stats(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
    ) -> Result<Json<EnrollmentStats>, ServiceError> {
        Ok(Json(app.stats(&principal).await?))
    }

    #[instrument(skip(app))]
    pub async fn details(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(id): Path<String>,
    ) -> Result<Json<Enrollment>, ServiceError> {
        let enrollment = Record::<Enrollment>::new(id);
        Ok(Json(app.details(&principal, &enrollment).await?))
    }

    #[instrument(skip(app))]
    pub async fn complete_lesson(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(id): Path<String>,
        Json(command): Json<CompleteLessonCommand>,
    ) -> Result<Json<Enrollment>, ServiceError> {
        let enrollment = Record::<Enrollment>::new(id);
        Ok(Json(app.complete_lesson(&principal, &enrollment, &command).await?))
    }

    #[instrument(skip(app))]
    pub async fn refresh_progress(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(id): Path<String>,
    ) -> Result<Json<ProgressSummary>, ServiceError> {
        let enrollment = Record::<Enrollment>::new(id);
        Ok(Json(app.update_progress(&principal, &enrollment).await?))
    }

    #[instrument(skip(app))]
    pub async fn record_progress(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(id): Path<String>,
        Json(command): Json<CompleteLessonCommand>,
    ) -> Result<Json<ProgressSummary>, ServiceError> {
        let enrollment = Record::<Enrollment>::new(id);
        Ok(Json(app.record_progress(&principal, &enrollment, &command).await?))
    }

    #[instrument(skip(app))]
    pub async fn add_note(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(id): Path<String>,
        Json(command): Json<NoteCommand>,
    ) -> Result<Json<Enrollment>, ServiceError> {
        let enrollment = Record::<Enrollment>::new(id);
        Ok(Json(app.add_note(&principal, &enrollment, &command).await?))
    }

    #[instrument(skip(app))]
    pub async fn drop(
        State(app): State<App>,
        Authenticated(principal): Authenticated,
        Path(id): Path<String>,
    ) -> Result<Json<Enrollment>, ServiceError> {
        let enrollment = Record::<Enrollment>::new(id);
        Ok(Json(app.drop_enrollment(&principal, &enrollment).await?))
    }
}
