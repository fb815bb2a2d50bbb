pub use course::*;
pub use enrollment::*;
pub use lesson::*;
pub use timestamp::*;
pub use user::*;

mod course;
mod enrollment;
mod lesson;
mod timestamp;
mod user;
