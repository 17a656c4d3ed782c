//! Account-level housekeeping on top of the request funnel: resolving the
//! numeric account id and clearing the notification backlog.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::dispatch::Dispatcher;
use crate::error::{OkToolsError, Result};

static STAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class="stamp"[^0-9]*(\d+)"#).expect("static regex"));
static FORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<form[^>]*action="([^"]+)"[^>]*>(.*?)</form>"#).expect("static regex")
});
static HIDDEN_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<input[^>]*type="hidden"[^>]*name="([^"]+)"[^>]*value="([^"]*)""#)
        .expect("static regex")
});

/// One hidden-input form scraped off a notification block.
#[derive(Debug, PartialEq, Eq)]
struct NotificationForm {
    action: String,
    fields: Vec<(String, String)>,
}

/// Operations on the logged-in account itself.
#[derive(Debug)]
pub struct AccountControl {
    dispatcher: Dispatcher,
}

impl AccountControl {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn into_inner(self) -> Dispatcher {
        self.dispatcher
    }

    pub fn dispatcher(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Resolve the numeric id of the logged-in account by scraping the
    /// profile stamp off the settings page.
    #[instrument(skip(self))]
    pub async fn account_id(&mut self) -> Result<u64> {
        let path = self.dispatcher.session().pages().settings.clone();
        let body = self.dispatcher.attend_page(&path, false, &[]).await?;

        match STAMP_RE.captures(&body).and_then(|caps| caps[1].parse().ok()) {
            Some(id) => {
                debug!("resolved account id {}", id);
                Ok(id)
            }
            None => Err(OkToolsError::ItemNotFound {
                details: "no profile stamp on the settings page".to_string(),
                body,
            }),
        }
    }

    /// Close pending notifications one at a time, revisiting the events page
    /// after each submission. Stops when the page has no closeable
    /// notification left or after `max_pages` visits, whichever comes first.
    /// The bound guards against a provider that keeps feeding new
    /// notifications faster than they are closed.
    #[instrument(skip(self))]
    pub async fn drain_notifications(&mut self, max_pages: u32) -> Result<u32> {
        let path = self.dispatcher.session().pages().events.clone();
        let mut drained = 0;

        for _ in 0..max_pages {
            let body = self.dispatcher.attend_page(&path, false, &[]).await?;
            let Some(form) = parse_notification_form(&body) else {
                break;
            };
            self.dispatcher
                .send_form(&form.action, &form.fields, false, &[])
                .await?;
            drained += 1;
        }

        info!("closed {} notifications", drained);
        Ok(drained)
    }
}

/// First notification form on the events page: the action path plus its
/// hidden inputs. Forms without hidden inputs are navigation chrome, not
/// notifications.
fn parse_notification_form(body: &str) -> Option<NotificationForm> {
    for caps in FORM_RE.captures_iter(body) {
        let fields: Vec<(String, String)> = HIDDEN_INPUT_RE
            .captures_iter(&caps[2])
            .map(|h| (h[1].to_string(), h[2].to_string()))
            .collect();
        if fields.is_empty() {
            continue;
        }
        return Some(NotificationForm {
            action: caps[1].trim_start_matches('/').to_string(),
            fields,
        });
    }
    None
}
