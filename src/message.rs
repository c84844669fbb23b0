use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::dom::HtmlPage;
use crate::model::ExtractionResult;
use crate::parser;

/// Commands accepted by the page-resident extraction endpoint. Wire shape is
/// the extension protocol: `{"action": "scrape"}` / `{"action": "ping"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Scrape,
    Ping,
}

/// Response envelope: success flag plus whichever of data/error/message the
/// command produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    fn ok(data: ExtractionResult) -> Response {
        Response {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    fn ack(message: &str) -> Response {
        Response {
            success: true,
            data: None,
            error: None,
            message: Some(message.to_string()),
        }
    }

    fn failure(error: impl Into<String>) -> Response {
        Response {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

/// Handle one command against an (optionally) loaded page.
///
/// `Ping` answers without touching any document. `Scrape` runs a full
/// extraction and converts any internal fault, panics included, into a
/// structured failure response: the caller always gets an envelope back,
/// never a crash. A missing page is such a failure too, distinguishable from
/// a successful-but-empty extraction.
pub fn handle(request: Request, page: Option<&HtmlPage>) -> Response {
    match request {
        Request::Ping => Response::ack("extraction endpoint active"),
        Request::Scrape => {
            let Some(page) = page else {
                return Response::failure("no page loaded");
            };
            match catch_unwind(AssertUnwindSafe(|| parser::scrape_meal_plan(&page.root()))) {
                Ok(data) => Response::ok(data),
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    error!(error = %msg, "extraction fault");
                    Response::failure(msg)
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected extraction fault".to_string()
    }
}
