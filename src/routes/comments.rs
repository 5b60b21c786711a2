use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::helpers::discovery::DEFAULT_PAGE_SIZE;
use crate::AppState;

#[derive(Deserialize)]
pub struct CommentsPath {
    pub video_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsParams {
    offset: Option<u64>,
    limit: Option<u64>,
    chain_id: Option<u64>,
}

#[get("/{video_id}")]
pub async fn get_comments(
    path: web::Path<CommentsPath>,
    params: web::Query<CommentsParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let comments = state
        .social(params.chain_id)?
        .get_comments(
            path.video_id,
            params.offset.unwrap_or(0),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(HttpResponse::Ok().json(comments))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInfo {
    video_id: u64,
    #[validate(length(min = 1, max = 500))]
    content: String,
    chain_id: Option<u64>,
}

#[post("/")]
pub async fn create_comment(data: web::Json<CreateCommentInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    data.validate()?;

    let tx = state
        .social_calls(data.chain_id)?
        .post_comment(data.video_id, &data.content)?;

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRefInfo {
    video_id: u64,
    comment_index: u64,
    chain_id: Option<u64>,
}

#[post("/like")]
pub async fn like_comment(data: web::Json<CommentRefInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tx = state
        .social_calls(data.chain_id)?
        .like_comment(data.video_id, data.comment_index);

    Ok(HttpResponse::Ok().json(tx))
}

#[post("/delete")]
pub async fn delete_comment(data: web::Json<CommentRefInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tx = state
        .social_calls(data.chain_id)?
        .delete_comment(data.video_id, data.comment_index);

    Ok(HttpResponse::Ok().json(tx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawTipsInfo {
    chain_id: Option<u64>,
}

#[post("/withdraw-tips")]
pub async fn withdraw_tips(data: web::Json<WithdrawTipsInfo>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tx = state.social_calls(data.chain_id)?.withdraw_tips();

    Ok(HttpResponse::Ok().json(tx))
}
