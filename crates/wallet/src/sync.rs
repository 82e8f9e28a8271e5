//! Incremental history synchronization over an offset-paged listing.
//!
//! Forward passes walk from the newest page down until they meet the newest
//! transaction already held, so nothing that arrived between two passes is
//! skipped. Backward passes extend the tail one page at a time until the
//! indexer returns a short page. Offsets drift as transactions arrive at the
//! head, so every anchored read locates its anchor in the returned window
//! instead of trusting the offset.

use std::collections::HashSet;

use litewallet_log::{log_debug, log_info, log_warn};

use crate::classifier::TransactionView;
use crate::error::WalletError;

/// Position of a history page in the remote, most-recent-first listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PageCursor {
    Latest,
    Offset(usize),
    /// Transactions listed after `txid`, which was last seen at `offset`.
    Before { txid: String, offset: usize },
}

impl PageCursor {
    /// First listing position to request. Offsets only grow as history is
    /// appended at the head, so an anchor's stored offset can lag behind its
    /// current position but never overshoot it.
    pub fn offset(&self) -> usize {
        match self {
            PageCursor::Latest => 0,
            PageCursor::Offset(offset) => *offset,
            PageCursor::Before { offset, .. } => *offset,
        }
    }

    fn anchor(&self) -> Option<&str> {
        match self {
            PageCursor::Before { txid, .. } => Some(txid),
            _ => None,
        }
    }

    fn shifted(self, arrived: usize) -> Self {
        match self {
            PageCursor::Latest => PageCursor::Latest,
            PageCursor::Offset(offset) => PageCursor::Offset(offset + arrived),
            PageCursor::Before { txid, offset } => PageCursor::Before {
                txid,
                offset: offset + arrived,
            },
        }
    }
}

/// Classified history window `[from, to)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryPage {
    pub items: Vec<TransactionView>,
    pub total_items: Option<usize>,
    pub from: usize,
    pub to: usize,
}

impl HistoryPage {
    pub fn has_more(&self) -> bool {
        self.total_items.is_some_and(|total| self.to < total)
    }

    fn is_last(&self, limit: usize) -> bool {
        self.items.len() < limit || self.total_items.is_some_and(|total| self.to >= total)
    }
}

/// Paged history provider the synchronizer pulls from.
///
/// `fetch_page` returns up to `limit` transactions of the most-recent-first
/// listing starting at `cursor.offset()`.
#[allow(async_fn_in_trait)]
pub trait HistorySource {
    async fn fetch_page(&self, cursor: &PageCursor, limit: usize) -> Result<HistoryPage, WalletError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncState {
    Idle,
    SyncingForward,
    SyncingBackward,
    /// No older history remains. Forward passes still run.
    Exhausted,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SyncReport {
    pub added: usize,
    pub pages: usize,
    /// False when the page cap stopped the pass before it reached its target.
    pub complete: bool,
}

/// Unfetched stretch between `resume` and the known transaction `stop_at`.
#[derive(Clone, Debug, Eq, PartialEq)]
struct PendingGap {
    resume: PageCursor,
    stop_at: String,
}

enum Walk {
    Reached,
    Capped(PageCursor),
}

/// Outcome of one anchored read.
enum Read {
    /// Transactions strictly after the anchor.
    Page {
        items: Vec<TransactionView>,
        last: bool,
        next: Option<PageCursor>,
    },
    Capped(PageCursor),
    /// The anchor is no longer listed.
    Lost,
}

/// Transactions fetched by one walk, to be spliced in after `anchor`.
struct Segment {
    anchor: Option<String>,
    items: Vec<TransactionView>,
}

pub struct HistorySynchronizer {
    page_size: usize,
    max_pages: usize,
    transactions: Vec<TransactionView>,
    gaps: Vec<PendingGap>,
    state: SyncState,
    exhausted: bool,
}

impl HistorySynchronizer {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
            transactions: Vec::new(),
            gaps: Vec::new(),
            state: SyncState::Idle,
            exhausted: false,
        }
    }

    /// Held history, most recent first.
    pub fn transactions(&self) -> &[TransactionView] {
        &self.transactions
    }

    pub fn get(&self, txid: &str) -> Option<&TransactionView> {
        self.transactions.iter().find(|tx| tx.id == txid)
    }

    pub fn latest_id(&self) -> Option<&str> {
        self.transactions.first().map(|tx| tx.id.as_str())
    }

    pub fn oldest_id(&self) -> Option<&str> {
        self.transactions.last().map(|tx| tx.id.as_str())
    }

    pub fn state(&self) -> SyncState {
        if self.state == SyncState::Idle && self.exhausted {
            SyncState::Exhausted
        } else {
            self.state
        }
    }

    pub fn has_pending_gap(&self) -> bool {
        !self.gaps.is_empty()
    }

    /// Replaces a held transaction with a fresher view. Unknown ids are ignored.
    pub fn update(&mut self, view: TransactionView) -> bool {
        match self.transactions.iter_mut().find(|tx| tx.id == view.id) {
            Some(slot) => {
                *slot = view;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.transactions.clear();
        self.gaps.clear();
        self.state = SyncState::Idle;
        self.exhausted = false;
    }

    /// Fetches everything newer than the newest held transaction, then resumes
    /// any gap an earlier capped pass left behind. Nothing is merged unless the
    /// pass completes or reaches the page cap.
    pub async fn sync_new<S: HistorySource>(&mut self, source: &S) -> Result<SyncReport, WalletError> {
        self.state = SyncState::SyncingForward;
        let result = self.forward_pass(source).await;
        self.state = SyncState::Idle;
        if let Err(err) = &result {
            log_warn!("forward history sync aborted: {err}");
        }
        result
    }

    /// Fetches the page below the oldest held transaction. A no-op once exhausted.
    pub async fn sync_old<S: HistorySource>(&mut self, source: &S) -> Result<SyncReport, WalletError> {
        if self.exhausted {
            return Ok(SyncReport {
                complete: true,
                ..SyncReport::default()
            });
        }
        let anchor = self.oldest_id().map(str::to_owned);
        let cursor = match &anchor {
            // Everything held is listed above the oldest, so this never overshoots.
            Some(oldest) => PageCursor::Before {
                txid: oldest.clone(),
                offset: self.transactions.len() - 1,
            },
            None => PageCursor::Latest,
        };

        let mut budget = self.max_pages;
        self.state = SyncState::SyncingBackward;
        let result = read_after(source, cursor, &mut budget, self.page_size).await;
        self.state = SyncState::Idle;
        let read = match result {
            Ok(read) => read,
            Err(err) => {
                log_warn!("backward history sync aborted: {err}");
                return Err(err);
            }
        };
        let pages = self.max_pages - budget;

        let (items, last) = match read {
            Read::Page { items, last, .. } => (items, last),
            Read::Capped(cursor) => {
                log_warn!(
                    "backward history sync gave up after {pages} pages; oldest transaction not reached by offset {}",
                    cursor.offset()
                );
                return Ok(SyncReport {
                    added: 0,
                    pages,
                    complete: false,
                });
            }
            Read::Lost => {
                log_warn!(
                    "oldest transaction {} is no longer listed; backward sync skipped",
                    anchor.as_deref().unwrap_or_default()
                );
                return Ok(SyncReport {
                    added: 0,
                    pages,
                    complete: false,
                });
            }
        };

        let fetched = items.len();
        let added = self.splice(Segment { anchor, items });
        if last {
            self.exhausted = true;
            log_info!("history exhausted after {} transactions", self.transactions.len());
        }
        log_debug!("backward sync: {fetched} older transactions over {pages} pages, {added} new");
        Ok(SyncReport {
            added,
            pages,
            complete: true,
        })
    }

    async fn forward_pass<S: HistorySource>(&mut self, source: &S) -> Result<SyncReport, WalletError> {
        let mut budget = self.max_pages;
        let mut segments = Vec::new();
        let mut gaps = Vec::new();

        let head = self.latest_id().map(str::to_owned);
        let (walk, items) =
            walk_down(source, PageCursor::Latest, head.as_deref(), &mut budget, self.page_size).await?;
        // Every gap anchor moved down by at least this many listing positions.
        let arrived = items.iter().filter(|tx| self.get(&tx.id).is_none()).count();
        segments.push(Segment {
            anchor: None,
            items,
        });
        if let (Walk::Capped(resume), Some(stop_at)) = (walk, head) {
            gaps.push(PendingGap { resume, stop_at });
        }

        for gap in &self.gaps {
            let resume = gap.resume.clone().shifted(arrived);
            if budget == 0 {
                gaps.push(PendingGap {
                    resume,
                    stop_at: gap.stop_at.clone(),
                });
                continue;
            }
            let anchor = resume.anchor().map(str::to_owned);
            let (walk, items) =
                walk_down(source, resume, Some(&gap.stop_at), &mut budget, self.page_size).await?;
            segments.push(Segment { anchor, items });
            if let Walk::Capped(resume) = walk {
                gaps.push(PendingGap {
                    resume,
                    stop_at: gap.stop_at.clone(),
                });
            }
        }

        let pages = self.max_pages - budget;
        let mut added = 0;
        // Gap segments first: their anchors are already held.
        for segment in segments.into_iter().rev() {
            added += self.splice(segment);
        }
        self.gaps = gaps;

        let complete = self.gaps.is_empty();
        if complete {
            log_info!("history synced: {added} new transactions over {pages} pages");
        } else {
            log_warn!(
                "history sync stopped at {} pages with {} gap(s) left; {added} new transactions merged",
                self.max_pages,
                self.gaps.len()
            );
        }
        Ok(SyncReport {
            added,
            pages,
            complete,
        })
    }

    /// Inserts the unknown items of `segment` after its anchor, in order, and
    /// refreshes the ones already held. Returns how many were inserted.
    fn splice(&mut self, segment: Segment) -> usize {
        let mut fresh = Vec::new();
        for item in segment.items {
            if !self.update(item.clone()) {
                fresh.push(item);
            }
        }
        let position = match segment.anchor {
            Some(anchor) => self
                .transactions
                .iter()
                .position(|tx| tx.id == anchor)
                .map_or(self.transactions.len(), |idx| idx + 1),
            None => 0,
        };
        let added = fresh.len();
        self.transactions.splice(position..position, fresh);
        added
    }
}

/// Reads the page after `cursor`'s anchor. Anchored reads request one extra
/// item so the anchor itself comes back first when nothing has moved; when it
/// is missing the whole window is newer and the read steps further down.
async fn read_after<S: HistorySource>(
    source: &S,
    mut cursor: PageCursor,
    budget: &mut usize,
    page_size: usize,
) -> Result<Read, WalletError> {
    loop {
        if *budget == 0 {
            return Ok(Read::Capped(cursor));
        }
        *budget -= 1;

        let anchor = cursor.anchor().map(str::to_owned);
        let limit = if anchor.is_some() { page_size + 1 } else { page_size };
        let start = cursor.offset();
        let mut page = source.fetch_page(&cursor, limit).await?;
        let last = page.is_last(limit);
        let next = page.items.last().map(|tx| PageCursor::Before {
            txid: tx.id.clone(),
            offset: start + page.items.len() - 1,
        });

        if let Some(anchor) = anchor {
            match page.items.iter().position(|tx| tx.id == anchor) {
                Some(idx) => {
                    page.items.drain(..=idx);
                }
                None if last => return Ok(Read::Lost),
                None => {
                    log_debug!("anchor {anchor} moved below offset {start}, reading further down");
                    cursor = PageCursor::Before {
                        txid: anchor,
                        offset: start + page.items.len(),
                    };
                    continue;
                }
            }
        }
        return Ok(Read::Page {
            items: page.items,
            last,
            next,
        });
    }
}

/// Follows pages downward from `cursor` until `stop_at` shows up, the source
/// runs dry, or the page budget is spent. Without `stop_at` only one page is
/// read. Items listed below `stop_at` are left out.
async fn walk_down<S: HistorySource>(
    source: &S,
    mut cursor: PageCursor,
    stop_at: Option<&str>,
    budget: &mut usize,
    page_size: usize,
) -> Result<(Walk, Vec<TransactionView>), WalletError> {
    let mut items: Vec<TransactionView> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    loop {
        let offset = cursor.offset();
        let (page, last, next) = match read_after(source, cursor, budget, page_size).await? {
            Read::Page { items, last, next } => (items, last, next),
            Read::Capped(resume) => return Ok((Walk::Capped(resume), items)),
            Read::Lost => {
                log_warn!("history anchor vanished near offset {offset}; walk ends early");
                return Ok((Walk::Reached, items));
            }
        };
        let found = stop_at.and_then(|id| page.iter().position(|tx| tx.id == id));
        log_debug!(
            "history page at offset {offset}: {} items, known head {}",
            page.len(),
            if found.is_some() { "found" } else { "not found" }
        );
        let keep = found.map_or(page.len(), |idx| idx + 1);
        for tx in page.into_iter().take(keep) {
            if seen.insert(tx.id.clone()) {
                items.push(tx);
            }
        }

        if found.is_some() || stop_at.is_none() || last {
            return Ok((Walk::Reached, items));
        }
        match next {
            Some(next) => cursor = next,
            None => return Ok((Walk::Reached, items)),
        }
    }
}
