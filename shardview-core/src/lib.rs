pub mod auction;
pub mod filter;
pub mod node;
pub mod queue;

pub use auction::NodeAuction;
pub use filter::{NodeFilter, NodeSort, Pagination, SortOrder};
pub use node::{Node, NodeStatus, NodeType};
pub use queue::QueueEntry;
