use crate::models::TrackResult;

/// Proof that a request was issued against a particular version of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// An ordered list of tracks that is only ever replaced wholesale.
///
/// Requests take a [`Ticket`] before going to the backend. A newer ticket,
/// clearing the list or leaving its view invalidates outstanding tickets, so
/// late answers are dropped instead of overwriting newer state.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    tracks: Vec<TrackResult>,
    epoch: u64,
}

impl CandidateList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[TrackResult] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackResult> {
        self.tracks.get(index)
    }

    /// Issue a ticket for a new request. Tickets issued earlier stop being
    /// current, so only the latest request may fill the list.
    pub fn ticket(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket(self.epoch)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.epoch
    }

    /// Replace the contents if `ticket` is still current
    pub fn replace(&mut self, ticket: Ticket, tracks: Vec<TrackResult>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.tracks = tracks;
        true
    }

    /// Drop outstanding tickets without touching the contents
    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }

    /// Empty the list and drop outstanding tickets
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.invalidate();
    }

    /// Remove the first entry with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.tracks.iter().position(|t| t.id == id) {
            Some(index) => {
                self.tracks.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_track;

    fn ids(list: &CandidateList) -> Vec<&str> {
        list.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_replace_with_current_ticket() {
        let mut list = CandidateList::new();
        let ticket = list.ticket();
        assert!(list.replace(ticket, vec![sample_track("1", "One"), sample_track("2", "Two")]));
        assert_eq!(ids(&list), vec!["1", "2"]);
    }

    #[test]
    fn test_stale_ticket_is_rejected() {
        let mut list = CandidateList::new();
        let first = list.ticket();
        list.replace(first, vec![sample_track("1", "One")]);

        let ticket = list.ticket();
        list.invalidate();

        assert!(!list.replace(ticket, vec![sample_track("9", "Late")]));
        assert_eq!(ids(&list), vec!["1"]);
    }

    #[test]
    fn test_remove_takes_exactly_one_matching_entry() {
        let mut list = CandidateList::new();
        let ticket = list.ticket();
        list.replace(
            ticket,
            vec![sample_track("1", "One"), sample_track("2", "Two"), sample_track("3", "Three")],
        );

        assert!(list.remove("2"));
        assert_eq!(ids(&list), vec!["1", "3"]);
        assert!(!list.remove("missing"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let mut list = CandidateList::new();
        let older = list.ticket();
        let newer = list.ticket();

        assert!(list.replace(newer, vec![sample_track("new", "New")]));
        assert!(!list.replace(older, vec![sample_track("old", "Old")]));
        assert_eq!(ids(&list), vec!["new"]);
    }

    #[test]
    fn test_clear_invalidates() {
        let mut list = CandidateList::new();
        let ticket = list.ticket();
        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_current(ticket));
    }
}
