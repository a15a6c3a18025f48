//! Domain-side emitters that push state changes to residents.

mod complaint;

pub use complaint::{
    ComplaintNotifier, ComplaintStatus, ComplaintStatusChanged, NoticePublished,
    COMPLAINT_STATUS_CHANGED, NOTICE_PUBLISHED,
};
