use std::collections::VecDeque;

use futures::Stream;
use http::Method;

use crate::error::{Error, Result};
use crate::query::chunk::ChunkPlan;
use crate::query::classify::classify_page;
use crate::query::link::resolve_link;
use crate::query::options::QueryOptions;
use crate::query::Record;
use crate::session::Session;
use crate::utils::constants::PAGE_PARAM;

/// How a dataset endpoint continues past the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationScheme {
    /// `page=1,2,...` until an empty page
    PageNumber,
    /// follow `Link: <...>; rel="next"` until it disappears or a page is empty
    Link,
}

/// What the next request is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    InitialOptions(QueryOptions),
    NextCursor(String),
}

/// Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    None,
    Page(u64),
    Link(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fetching,
    /// current page is the last one for the active chunk
    LastPage,
    Done,
}

/// Lazy record sequence over one dataset query.
///
/// Each call to [`RecordStream::next`] either pops a buffered record or
/// performs exactly one page request. At most one page is held in memory.
/// Dropping the stream early needs no cleanup.
#[derive(Debug)]
pub struct RecordStream<'a> {
    session: &'a mut Session,
    dataset: String,
    url: String,
    scheme: PaginationScheme,
    options: QueryOptions,
    first_page: u64,
    chunks: ChunkPlan,
    cursor: Cursor,
    buffer: VecDeque<Record>,
    state: State,
    pages: u64,
    emitted: u64,
    link_ignored: bool,
}

impl<'a> RecordStream<'a> {
    pub(crate) fn new(
        session: &'a mut Session,
        dataset: &str,
        mut options: QueryOptions,
        scheme: PaginationScheme,
        max_in_len: usize,
    ) -> Result<Self> {
        // link pagination sends `page` through like any other filter
        let first_page = match scheme {
            PaginationScheme::Link => 1,
            PaginationScheme::PageNumber => match options.remove(PAGE_PARAM) {
                None => 1,
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| Error::query(format!("invalid page number '{}'", raw)))?,
            },
        };

        let chunks = ChunkPlan::from_options(&options, max_in_len);
        if chunks.is_chunked() {
            session.diagnostics().debug(&format!(
                "{}: in-list filter split into {} request groups",
                dataset,
                chunks.len()
            ));
        }

        let url = session.dataset_url(dataset);
        let mut stream = Self {
            session,
            dataset: dataset.to_string(),
            url,
            scheme,
            options,
            first_page,
            chunks,
            cursor: Cursor::None,
            buffer: VecDeque::new(),
            state: State::Fetching,
            pages: 0,
            emitted: 0,
            link_ignored: false,
        };
        stream.cursor = stream.initial_cursor();
        Ok(stream)
    }

    /// Pull the next record. `Ok(None)` once the query is exhausted; after an
    /// error the stream is finished as well.
    pub async fn next(&mut self) -> Result<Option<Record>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                self.emitted += 1;
                return Ok(Some(record));
            }

            match self.state {
                State::Done => return Ok(None),
                State::LastPage => {
                    self.finish_chunk();
                    continue;
                }
                State::Fetching => {}
            }

            let page = match self.fetch_page().await {
                Ok(page) => page,
                Err(e) => {
                    self.state = State::Done;
                    return Err(e);
                }
            };
            self.pages += 1;

            if page.records.is_empty() {
                self.finish_chunk();
                continue;
            }

            match self.scheme {
                PaginationScheme::PageNumber => {
                    if page.next.is_some() && !self.link_ignored {
                        self.link_ignored = true;
                        self.session.diagnostics().debug(&format!(
                            "{}: ignoring Link header, paginating by page number",
                            self.dataset
                        ));
                    }
                    if let Cursor::Page(n) = self.cursor {
                        self.cursor = Cursor::Page(n + 1);
                    }
                }
                PaginationScheme::Link => match page.next {
                    Some(link) => self.cursor = Cursor::Link(resolve_link(self.session.api_url(), &link)),
                    None => {
                        self.cursor = Cursor::None;
                        self.state = State::LastPage;
                    }
                },
            }
            self.buffer = page.records.into();
        }
    }

    /// Drain the remaining records into memory.
    pub async fn collect_all(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Adapt into a `futures::Stream`; it ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> + 'a {
        futures::stream::try_unfold(self, |mut stream| async move {
            Ok::<_, Error>(stream.next().await?.map(|record| (record, stream)))
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Page requests that returned successfully so far.
    pub fn pages_fetched(&self) -> u64 {
        self.pages
    }

    pub fn records_emitted(&self) -> u64 {
        self.emitted
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done && self.buffer.is_empty()
    }

    /// The request the next fetch would send.
    pub fn next_request(&self) -> PageRequest {
        match &self.cursor {
            Cursor::Link(link) => PageRequest::NextCursor(link.clone()),
            Cursor::Page(n) => PageRequest::InitialOptions(self.chunks.apply(&self.options).with(PAGE_PARAM, n)),
            Cursor::None => PageRequest::InitialOptions(self.chunks.apply(&self.options)),
        }
    }

    fn initial_cursor(&self) -> Cursor {
        match self.scheme {
            PaginationScheme::PageNumber => Cursor::Page(self.first_page),
            PaginationScheme::Link => Cursor::None,
        }
    }

    /// Move on to the next filter chunk with a fresh cursor, or finish.
    fn finish_chunk(&mut self) {
        if self.chunks.advance() {
            self.session
                .diagnostics()
                .debug(&format!("{}: moving to next in-list filter chunk", self.dataset));
            self.cursor = self.initial_cursor();
            self.state = State::Fetching;
        } else {
            self.cursor = Cursor::None;
            self.state = State::Done;
        }
    }

    async fn fetch_page(&mut self) -> Result<crate::query::classify::Page> {
        let (url, params) = match self.next_request() {
            PageRequest::InitialOptions(options) => (self.url.clone(), options.to_params()),
            PageRequest::NextCursor(link) => (link, Vec::new()),
        };
        self.session
            .execute(Method::GET, &url, &params, &self.dataset, classify_page)
            .await
    }
}
