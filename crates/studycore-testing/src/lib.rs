//! Fixture builders and a `World` test harness shared by every crate's
//! integration tests (mirrors `agtrace-testing`'s role in the teacher
//! workspace, minus the log-sample/CLI-subprocess concerns that have no
//! counterpart here).

pub mod assertions;
pub mod clock;
pub mod fixtures;
pub mod world;

pub use clock::TestClock;
pub use fixtures::GameConfigFixture;
pub use world::World;
