mod answers;
mod bank;
mod favorites;
mod ids;
mod question;

pub use ids::{ChoiceKey, ParseIdError, QuestionId};

pub use answers::{AnswerRecord, next_selection};
pub use bank::{BankError, QuestionBank};
pub use favorites::FavoriteSet;
pub use question::{Question, QuestionError, QuestionKind, QuestionRecord};
