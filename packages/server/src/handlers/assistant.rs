//! LLM-backed endpoints: the location chatbot and the public safety
//! assistant.

use actix_web::{HttpResponse, web};
use crimewatch_ai::chatbot::answer_question;
use crimewatch_ai::{MAX_QUESTION_CHARS, safety};
use crimewatch_database::crimes;
use crimewatch_server_models::{
    ApiData, ApiError, AssistantQueryRequest, ChatbotReply, ChatbotRequest, Enveloped,
};

use super::non_empty;
use crate::AppState;

/// Crime reports embedded as chatbot context per question.
const CHATBOT_CONTEXT_ROWS: u32 = 100;

/// `POST /api/chatbot`
///
/// Answers a question about one location from its recent crime reports.
/// Unlike the safety assistant there is no canned fallback here;
/// provider failures surface as a 500.
pub async fn chatbot(state: web::Data<AppState>, body: web::Json<ChatbotRequest>) -> HttpResponse {
    let (Some(location_id), Some(question)) = (body.location_id, non_empty(&body.question)) else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "Parameters location_id and question are required.",
        ));
    };
    if question.chars().count() > MAX_QUESTION_CHARS {
        return HttpResponse::BadRequest()
            .json(ApiError::new("Question too long. Maximum 500 characters."));
    }

    let rows = match crimes::recent_for_location(
        state.db.as_ref(),
        location_id,
        CHATBOT_CONTEXT_ROWS,
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Failed to load chatbot context for location {location_id}: {e}");
            return HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to fetch crime data."));
        }
    };
    if rows.is_empty() {
        return HttpResponse::NotFound().json(ApiError::new("No crime data for this location."));
    }

    let context = match serde_json::to_string(&rows) {
        Ok(context) => context,
        Err(e) => {
            log::error!("Failed to serialize chatbot context: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new("Server error."));
        }
    };

    match answer_question(state.provider.as_ref(), &context, question).await {
        Ok(reply) => HttpResponse::Ok().json(ChatbotReply { reply }),
        Err(e) => {
            log::error!("Chatbot completion failed: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to reach the language model API."))
        }
    }
}

/// `POST /api/assistant/query`
///
/// Never fails toward the visitor: provider errors produce the canned
/// fallback reply inside [`safety::answer_query`].
pub async fn query(
    state: web::Data<AppState>,
    body: web::Json<AssistantQueryRequest>,
) -> HttpResponse {
    let Some(question) = non_empty(&body.question) else {
        return HttpResponse::BadRequest().json(ApiError::new("Parameter question is required."));
    };
    if question.chars().count() > MAX_QUESTION_CHARS {
        return HttpResponse::BadRequest()
            .json(ApiError::new("Question too long. Maximum 500 characters."));
    }

    let reply =
        safety::answer_query(state.provider.as_ref(), question, body.location.as_deref()).await;
    HttpResponse::Ok().json(Enveloped::new(reply))
}

/// `GET /api/assistant/popular-queries`
pub async fn popular_queries() -> HttpResponse {
    HttpResponse::Ok().json(ApiData::new(safety::popular_queries()))
}

/// `GET /api/assistant/safety-tips/{location}`
pub async fn safety_tips(path: web::Path<String>) -> HttpResponse {
    match safety::safety_sheet(&path) {
        Some(sheet) => HttpResponse::Ok().json(ApiData::new(sheet)),
        None => HttpResponse::NotFound().json(ApiError::new("Location not found.")),
    }
}
