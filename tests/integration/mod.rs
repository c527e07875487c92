//! Integration tests for cargo-lockstep
//!
//! Each test builds a throwaway repository in a temp dir and drives the
//! compiled binary the way a release script would.


mod test_bump;
mod test_check;
mod test_init;
