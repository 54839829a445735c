//! Response envelopes and paging parameters.

use serde::{Deserialize, Serialize};

/// A transport response: status, payload and the metadata the screens use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    /// HTTP status code.
    pub status: u16,

    /// Decoded body, if the response carried one.
    pub body: Option<T>,

    /// Total number of records across all pages (`X-Total-Count`).
    pub total_count: Option<u64>,

    /// Alert raised by the backend, if any.
    pub alert: Option<Alert>,
}

/// Backend alert carried in response headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert message key (e.g. `amachouApp.hospital.created`).
    pub message: String,

    /// Parameter for the message, usually the entity identifier.
    pub param: Option<String>,
}

impl<T> Envelope<T> {
    /// A successful 200 response with the given body.
    pub fn ok(body: T) -> Self {
        Self::with_status(200, Some(body))
    }

    /// A response with an explicit status and optional body.
    pub fn with_status(status: u16, body: Option<T>) -> Self {
        Self {
            status,
            body,
            total_count: None,
            alert: None,
        }
    }

    /// Attach a total record count.
    pub fn with_total_count(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Attach an alert.
    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alert = Some(alert);
        self
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Consume the envelope, returning the body.
    pub fn into_body(self) -> Option<T> {
        self.body
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Page, size and sort for list and search queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,

    /// Page size.
    pub size: u32,

    /// Sort field and direction.
    pub sort: Option<(String, Direction)>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: None,
        }
    }
}

impl PageRequest {
    /// Request the given page with the default size.
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Sets the page size.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets the sort field and direction.
    pub fn sorted_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    /// Query parameters in the `page`, `size`, `sort=field,dir` form the
    /// REST resource expects.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some((field, direction)) = &self.sort {
            let dir = match direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            params.push(("sort", format!("{field},{dir}")));
        }
        params
    }
}
