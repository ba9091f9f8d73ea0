mod filter;
mod toast;
mod vote;

pub use filter::{EmptyReason, ToastFilter, TOP_TOAST_LIMIT};
pub use toast::{
    NewToast, Toast, ToastWithUserVote, DEFAULT_CREATOR, MAX_CREATOR_LENGTH, MAX_TOAST_LENGTH,
};
pub use vote::{LocalVote, Vote, VoteChange, VoteDelta};
