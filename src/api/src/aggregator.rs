//! Fuses bank events into tag records, runs the liveness watchdog, and owns
//! both the current-tag pointer and the deduplicated tag history.

use crate::config::{CURRENT_TAG_TIMEOUT, NUM_USER_DATAGRAMS};
use crate::driver::BankEvent;
use std::fmt::Write as _;
use std::time::Instant;

/// A tag's identity and bank contents as observed so far. Empty fields mean
/// "not yet observed".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagRecord {
    /// Transponder ID, up to 12 bytes.
    pub tid: Vec<u8>,
    /// Electronic Product Code, up to 12 bytes.
    pub epc: Vec<u8>,
    /// Reserved/access password bank, up to 8 bytes.
    pub rfu: Vec<u8>,
    /// The four 16-byte user-bank datagrams, indexed by datagram number.
    pub user: [Vec<u8>; NUM_USER_DATAGRAMS],
}

impl TagRecord {
    fn new() -> Self {
        Self::default()
    }

    /// A tag counts as identified once either `tid` or `epc` is non-empty.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        !self.tid.is_empty() || !self.epc.is_empty()
    }

    /// The four user datagrams concatenated in index order, including any
    /// still-empty ones.
    #[must_use]
    pub fn user_data(&self) -> Vec<u8> {
        self.user.iter().flat_map(|d| d.iter().copied()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum BankField {
    Tid,
    Epc,
    Rfu,
    User(usize),
}

fn field_mut(tag: &mut TagRecord, field: BankField) -> &mut Vec<u8> {
    match field {
        BankField::Tid => &mut tag.tid,
        BankField::Epc => &mut tag.epc,
        BankField::Rfu => &mut tag.rfu,
        BankField::User(i) => &mut tag.user[i],
    }
}

fn field_ref(tag: &TagRecord, field: BankField) -> &Vec<u8> {
    match field {
        BankField::Tid => &tag.tid,
        BankField::Epc => &tag.epc,
        BankField::Rfu => &tag.rfu,
        BankField::User(i) => &tag.user[i],
    }
}

fn merge_fields(target: &mut TagRecord, source: &TagRecord) {
    if !source.tid.is_empty() {
        target.tid = source.tid.clone();
    }
    if !source.epc.is_empty() {
        target.epc = source.epc.clone();
    }
    if !source.rfu.is_empty() {
        target.rfu = source.rfu.clone();
    }
    for i in 0..NUM_USER_DATAGRAMS {
        if !source.user[i].is_empty() {
            target.user[i] = source.user[i].clone();
        }
    }
}

/// Notifications the aggregator raises as it fuses events and ages tags out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatorEvent {
    /// The number of history entries changed.
    TagCountChanged(usize),
    /// The current tag became this record, or `None` if it expired.
    CurrentTagChanged(Option<TagRecord>),
    /// An existing history entry (not necessarily the current tag) gained
    /// or changed a field.
    TagUpdated(TagRecord),
}

/// Owns the current-tag pointer and the tag history; the sole authority on
/// both, per the ownership split described alongside the Reader Driver.
pub struct Aggregator {
    history: Vec<TagRecord>,
    current_index: Option<usize>,
    last_event: Option<Instant>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Build an aggregator with empty history and no current tag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            current_index: None,
            last_event: None,
        }
    }

    /// The tag currently in the RF field, if the watchdog hasn't expired.
    #[must_use]
    pub fn current_tag(&self) -> Option<&TagRecord> {
        self.current_index.map(|i| &self.history[i])
    }

    /// All tags seen this session, in first-observed order (after dedup).
    #[must_use]
    pub fn history(&self) -> &[TagRecord] {
        &self.history
    }

    /// Number of entries in the history.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.history.len()
    }

    /// Drop all history and the current tag.
    pub fn clear_history(&mut self) -> Vec<AggregatorEvent> {
        let mut events = Vec::new();
        if !self.history.is_empty() {
            events.push(AggregatorEvent::TagCountChanged(0));
        }
        if self.current_index.is_some() {
            events.push(AggregatorEvent::CurrentTagChanged(None));
        }
        self.history.clear();
        self.current_index = None;
        self.last_event = None;
        events
    }

    /// Fuse one bank event, restarting the watchdog.
    pub fn on_bank_event(&mut self, event: BankEvent, now: Instant) -> Vec<AggregatorEvent> {
        match event {
            BankEvent::Epc(payload) => self.fuse(BankField::Epc, payload, now),
            BankEvent::Tid(payload) => self.fuse(BankField::Tid, payload, now),
            BankEvent::Rfu(payload) => self.fuse(BankField::Rfu, payload, now),
            BankEvent::User { datagram, payload } => self.fuse(BankField::User(datagram), payload, now),
        }
    }

    /// Expire the current tag if no bank event has arrived within
    /// [`CURRENT_TAG_TIMEOUT`]. History is untouched.
    pub fn check_watchdog(&mut self, now: Instant) -> Option<AggregatorEvent> {
        let last = self.last_event?;
        if self.current_index.is_some() && now.saturating_duration_since(last) >= CURRENT_TAG_TIMEOUT {
            self.current_index = None;
            log::debug!("current tag expired after {CURRENT_TAG_TIMEOUT:?} without a bank update");
            return Some(AggregatorEvent::CurrentTagChanged(None));
        }
        None
    }

    /// Hex dump of `TID`, `EPC`, user data, and `RFU` in that order, each
    /// section preceded by a `# <section> (<n> bytes)` header.
    #[must_use]
    pub fn memory_map(tag: &TagRecord) -> String {
        let user = tag.user_data();
        let mut out = String::new();
        for (label, bytes) in [
            ("TID", tag.tid.as_slice()),
            ("EPC", tag.epc.as_slice()),
            ("USER", user.as_slice()),
            ("RFU", tag.rfu.as_slice()),
        ] {
            let _ = writeln!(out, "# {label} ({} bytes)", bytes.len());
            out.push_str(&hex_dump_lines(bytes));
        }
        out
    }

    /// CSV header matching the mandated column order.
    #[must_use]
    pub fn csv_header() -> &'static str {
        "Tag ID,EPC,User Data,Reserved Data"
    }

    /// One CSV row for `tag`: hex byte pairs, space-separated, per column.
    #[must_use]
    pub fn csv_row(tag: &TagRecord) -> String {
        format!(
            "{},{},{},{}",
            hex_pairs(&tag.tid),
            hex_pairs(&tag.epc),
            hex_pairs(&tag.user_data()),
            hex_pairs(&tag.rfu),
        )
    }

    fn fuse(&mut self, field: BankField, payload: Vec<u8>, now: Instant) -> Vec<AggregatorEvent> {
        self.last_event = Some(now);
        let mut events = Vec::new();

        let Some(idx) = self.current_index else {
            let mut record = TagRecord::new();
            *field_mut(&mut record, field) = payload;
            self.history.push(record.clone());
            let new_idx = self.history.len() - 1;
            self.current_index = Some(new_idx);
            events.push(AggregatorEvent::TagCountChanged(self.history.len()));
            events.push(AggregatorEvent::CurrentTagChanged(Some(record)));
            return events;
        };

        let existing = field_ref(&self.history[idx], field).clone();
        if existing == payload {
            return events;
        }

        if existing.is_empty() {
            *field_mut(&mut self.history[idx], field) = payload;
            events.push(AggregatorEvent::TagUpdated(self.history[idx].clone()));
            let candidate = self.history[idx].clone();
            let (merged_idx, merge_events) = self.merge_into_history(candidate, Some(idx));
            events.extend(merge_events);
            let swept_idx = self.dedup_sweep(merged_idx);
            self.current_index = Some(swept_idx);
        } else {
            let mut candidate = TagRecord::new();
            *field_mut(&mut candidate, field) = payload;
            let (merged_idx, merge_events) = self.merge_into_history(candidate, None);
            events.extend(merge_events);
            let swept_idx = self.dedup_sweep(merged_idx);
            self.current_index = Some(swept_idx);
            events.push(AggregatorEvent::CurrentTagChanged(Some(self.history[swept_idx].clone())));
        }

        events
    }

    /// Find a history entry matching `candidate` by non-empty EPC or TID and
    /// merge into it, or append `candidate` as a new entry. `exclude_index`
    /// is the slot `candidate` already occupies (the refine case), if any.
    fn merge_into_history(
        &mut self,
        candidate: TagRecord,
        exclude_index: Option<usize>,
    ) -> (usize, Vec<AggregatorEvent>) {
        let mut events = Vec::new();

        let found = self
            .history
            .iter()
            .enumerate()
            .find(|(i, h)| {
                if Some(*i) == exclude_index {
                    return false;
                }
                (!candidate.epc.is_empty() && h.epc == candidate.epc)
                    || (!candidate.tid.is_empty() && h.tid == candidate.tid)
            })
            .map(|(i, _)| i);

        match found {
            Some(found_idx) => {
                merge_fields(&mut self.history[found_idx], &candidate);
                if let Some(old_idx) = exclude_index {
                    if old_idx != found_idx {
                        self.history.remove(old_idx);
                        let adjusted = if found_idx > old_idx { found_idx - 1 } else { found_idx };
                        return (adjusted, events);
                    }
                }
                (found_idx, events)
            }
            None => match exclude_index {
                Some(old_idx) => (old_idx, events),
                None => {
                    self.history.push(candidate);
                    let new_idx = self.history.len() - 1;
                    events.push(AggregatorEvent::TagCountChanged(self.history.len()));
                    (new_idx, events)
                }
            },
        }
    }

    /// Remove later duplicates (same non-empty TID, or fully identity-equal)
    /// from history, returning `focus_idx`'s position after the sweep.
    fn dedup_sweep(&mut self, focus_idx: usize) -> usize {
        let mut kept: Vec<TagRecord> = Vec::with_capacity(self.history.len());
        let mut new_focus = 0usize;

        for (j, rec) in self.history.iter().cloned().enumerate() {
            let dup_of = kept.iter().position(|existing| {
                (!rec.tid.is_empty() && !existing.tid.is_empty() && rec.tid == existing.tid)
                    || *existing == rec
            });
            match dup_of {
                Some(i) => {
                    if j == focus_idx {
                        new_focus = i;
                    }
                }
                None => {
                    if j == focus_idx {
                        new_focus = kept.len();
                    }
                    kept.push(rec);
                }
            }
        }

        self.history = kept;
        new_focus
    }
}

fn hex_pairs(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{b:02X}");
    }
    s
}

fn hex_dump_lines(bytes: &[u8]) -> String {
    let mut out = String::new();
    if bytes.is_empty() {
        return out;
    }
    for chunk in bytes.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
            .collect();
        let _ = writeln!(out, "{:<47}  {ascii}", hex.join(" "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_epc_event_creates_current_tag() {
        let mut agg = Aggregator::new();
        let events = agg.on_bank_event(BankEvent::Epc(vec![1, 2, 3]), Instant::now());
        assert_eq!(events.len(), 2);
        assert_eq!(agg.tag_count(), 1);
        assert_eq!(agg.current_tag().unwrap().epc, vec![1, 2, 3]);
    }

    #[test]
    fn different_epc_while_current_starts_a_new_tag() {
        let mut agg = Aggregator::new();
        let t0 = Instant::now();
        agg.on_bank_event(BankEvent::Epc(vec![1, 2, 3]), t0);
        agg.on_bank_event(BankEvent::Epc(vec![9, 9, 9]), t0);
        assert_eq!(agg.tag_count(), 2);
        assert_eq!(agg.current_tag().unwrap().epc, vec![9, 9, 9]);
    }

    #[test]
    fn tid_after_epc_refines_current_tag() {
        let mut agg = Aggregator::new();
        let t0 = Instant::now();
        agg.on_bank_event(BankEvent::Epc(vec![1, 2, 3]), t0);
        agg.on_bank_event(BankEvent::Tid(vec![4, 5, 6]), t0);
        assert_eq!(agg.tag_count(), 1);
        let current = agg.current_tag().unwrap();
        assert_eq!(current.epc, vec![1, 2, 3]);
        assert_eq!(current.tid, vec![4, 5, 6]);
    }

    #[test]
    fn history_dedups_on_matching_tid() {
        let mut agg = Aggregator::new();
        let t0 = Instant::now();
        agg.on_bank_event(BankEvent::Tid(vec![7, 7, 7]), t0);
        agg.on_bank_event(BankEvent::Epc(vec![1, 1, 1]), t0);
        // A second, distinct-looking tag that happens to share the TID.
        agg.on_bank_event(BankEvent::Epc(vec![2, 2, 2]), t0);
        agg.on_bank_event(BankEvent::Tid(vec![7, 7, 7]), t0);
        assert_eq!(agg.tag_count(), 1);
    }

    #[test]
    fn watchdog_clears_current_tag_but_keeps_history() {
        let mut agg = Aggregator::new();
        let t0 = Instant::now();
        agg.on_bank_event(BankEvent::Epc(vec![1, 2, 3]), t0);
        let expired = agg.check_watchdog(t0 + CURRENT_TAG_TIMEOUT + Duration::from_millis(1));
        assert_eq!(expired, Some(AggregatorEvent::CurrentTagChanged(None)));
        assert!(agg.current_tag().is_none());
        assert_eq!(agg.tag_count(), 1);
    }

    #[test]
    fn clear_history_removes_everything() {
        let mut agg = Aggregator::new();
        let t0 = Instant::now();
        agg.on_bank_event(BankEvent::Epc(vec![1, 2, 3]), t0);
        agg.clear_history();
        assert_eq!(agg.tag_count(), 0);
        assert!(agg.current_tag().is_none());
    }

    #[test]
    fn csv_row_matches_column_order() {
        let mut tag = TagRecord::new();
        tag.tid = vec![0xAB];
        tag.epc = vec![0xCD];
        tag.rfu = vec![0xEF];
        assert_eq!(Aggregator::csv_row(&tag), "AB,CD,,EF");
    }
}
