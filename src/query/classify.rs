use serde_json::Value;

use crate::error::Error;
use crate::query::link::next_link;
use crate::query::Record;
use crate::transport::HttpResponse;

/// Tagged result of the post-response classification step.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// token rejected (401): refresh and replay the identical request
    Reauthenticate,
    Fatal(Error),
}

/// One page of a dataset query.
#[derive(Debug)]
pub struct Page {
    pub records: Vec<Record>,
    /// `rel="next"` target, if the server announced one
    pub next: Option<String>,
}

/// Map a status to the error taxonomy. Success statuses pass through.
pub fn classify_status(response: &HttpResponse, dataset: &str) -> Outcome<()> {
    let status = response.status.as_u16();
    match status {
        _ if response.is_success() => Outcome::Success(()),
        401 => Outcome::Reauthenticate,
        404 => Outcome::Fatal(Error::Dataset(dataset.to_string())),
        400 => Outcome::Fatal(Error::Query {
            status: Some(400),
            message: format!("Invalid query parameters for {}: {}", dataset, response.body),
        }),
        _ => Outcome::Fatal(Error::query_status(status, &response.body)),
    }
}

/// Classify a dataset page response and decode its records.
pub fn classify_page(response: &HttpResponse, dataset: &str) -> Outcome<Page> {
    match classify_status(response, dataset) {
        Outcome::Success(()) => {}
        Outcome::Reauthenticate => return Outcome::Reauthenticate,
        Outcome::Fatal(e) => return Outcome::Fatal(e),
    }

    let records = match decode_records(&response.body) {
        Ok(records) => records,
        Err(e) => return Outcome::Fatal(e),
    };

    let next = match response.header_joined(http::header::LINK.as_str()).as_deref().map(next_link) {
        Some(Ok(link)) => link,
        Some(Err(e)) => return Outcome::Fatal(e),
        None => None,
    };

    Outcome::Success(Page { records, next })
}

/// The body must be a JSON array of objects.
pub fn decode_records(body: &str) -> Result<Vec<Record>, Error> {
    let value: Value = serde_json::from_str(body).map_err(|_| Error::query(format!("Query Error: {}", body)))?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                other => Err(Error::query(format!("Query Error: expected record object, got {}", other))),
            })
            .collect(),
        other => Err(Error::query(format!("Query Error: expected a list of records, got {}", other))),
    }
}
