//! Modules bundled with the bot.

pub mod echo;
pub mod help;
pub mod mtga;
pub mod roll;
pub mod wa;

pub use echo::EchoModule;
pub use help::HelpModule;
pub use mtga::MtgaModule;
pub use roll::RollModule;
pub use wa::WolframModule;
