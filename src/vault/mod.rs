pub mod seeder;
pub mod templates;
