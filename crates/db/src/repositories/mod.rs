//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&Database` as the first argument.

mod crud;
pub mod project_repo;
pub mod roi_repo;
pub mod team_member_repo;

pub use project_repo::ProjectRepo;
pub use roi_repo::RoiRepo;
pub use team_member_repo::TeamMemberRepo;
