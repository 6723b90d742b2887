// Stateless, token-based paging over ordered collections

pub mod cursor;
pub mod page;

pub use cursor::{decode_cursor, encode_cursor, CursorDecodeError};
pub use page::{
    next_link, validate_page_size, Link, Page, PageCursor, PageMeta, PagePlan, PageRequest,
    PaginationError, PlanError,
};
