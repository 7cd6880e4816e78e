pub mod constants;
pub mod entities;
mod give_all;
mod mirror;
mod state_machine;
mod trick;
mod view;

pub use give_all::{GiveAllDenial, GiveAllOutcome, GiveAllRequest};
pub use mirror::MirrorState;
pub use state_machine::{KazhuthaState, PendingTrick, Phase, PlayError, PlayOutcome, SetupError};
pub use trick::{Trick, TrickPlay};
pub use view::{PlayerView, PublicState};
