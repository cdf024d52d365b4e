use crate::{ControlId, RequestId};

/// Page-wide interactivity while an upload is in flight.
///
/// `Inert` disables every control except `active`, the button that started
/// the upload. A successful upload is followed by a page reload, so only
/// the failure path calls `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLock {
    #[default]
    Live,
    Inert { active: ControlId },
}

impl PageLock {
    pub fn engage(&mut self, active: ControlId) {
        *self = PageLock::Inert { active };
    }

    pub fn release(&mut self) {
        *self = PageLock::Live;
    }

    pub fn permits(&self, control: ControlId) -> bool {
        match self {
            PageLock::Live => true,
            PageLock::Inert { active } => *active == control,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, PageLock::Inert { .. })
    }
}

/// Shared disable flag for every analyze control.
///
/// Held by at most one request. Coarser than the real constraint (one
/// analysis per target): a pending analysis blocks analysis of any file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupLock {
    held_by: Option<RequestId>,
}

impl GroupLock {
    /// Returns false, leaving the holder unchanged, if the group is taken.
    pub fn engage(&mut self, request: RequestId) -> bool {
        if self.held_by.is_some() {
            return false;
        }
        self.held_by = Some(request);
        true
    }

    /// Idempotent; a release by a request that does not hold the group is
    /// ignored.
    pub fn release(&mut self, request: RequestId) {
        if self.held_by == Some(request) {
            self.held_by = None;
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.held_by.is_some()
    }

    pub fn holder(&self) -> Option<RequestId> {
        self.held_by
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seq: u32) -> RequestId {
        RequestId { generation: 0, seq }
    }

    #[test]
    fn group_release_twice_leaves_group_free() {
        let mut group = GroupLock::default();
        assert!(group.engage(request(1)));
        group.release(request(1));
        group.release(request(1));
        assert!(!group.is_engaged());
        assert!(group.engage(request(2)));
    }

    #[test]
    fn group_refuses_second_holder() {
        let mut group = GroupLock::default();
        assert!(group.engage(request(1)));
        assert!(!group.engage(request(2)));
        group.release(request(2));
        assert_eq!(group.holder(), Some(request(1)));
    }

    #[test]
    fn inert_page_permits_only_active_control() {
        let mut page = PageLock::default();
        page.engage(ControlId(3));
        assert!(page.permits(ControlId(3)));
        assert!(!page.permits(ControlId(4)));
        page.release();
        assert!(page.permits(ControlId(4)));
    }
}
