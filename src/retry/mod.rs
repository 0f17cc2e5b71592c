mod outcome;

pub use outcome::RetryOutcome;
