// src/quiz/encoder.rs

use crate::models::{
    question::{Question, QuestionKey, QuestionOutput, QuizQuestionId},
    user_data::UserIncorrectQuestion,
};

/// Converts bank questions to client records with `quiz_` identifiers.
/// Display numbers start at `display_offset + 1`.
pub fn to_output(questions: &[&Question], display_offset: usize, course: &str) -> Vec<QuestionOutput> {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| QuestionOutput {
            quiz_question_id: QuizQuestionId::Quiz(QuestionKey {
                course: course.to_string(),
                chapter: q.original_chapter,
                index: q.original_index,
            }),
            display_number: display_offset + i + 1,
            original_chapter: q.chapter_key(),
            original_question_number: q.question_number.clone(),
            question_type: q.question_type.clone(),
            question_text: q.question_text.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer.clone(),
        })
        .collect()
}

/// Converts notebook entries to client records with `incorrect_` identifiers.
pub fn incorrect_to_output(
    entries: &[UserIncorrectQuestion],
    display_offset: usize,
    course: &str,
) -> Vec<QuestionOutput> {
    entries
        .iter()
        .enumerate()
        .map(|(i, iq)| QuestionOutput {
            quiz_question_id: QuizQuestionId::Incorrect {
                course: course.to_string(),
                chapter: iq.original_chapter.clone(),
                question_number: iq.question_number.clone(),
                list_index: display_offset + i,
            },
            display_number: display_offset + i + 1,
            original_chapter: iq.original_chapter.clone(),
            original_question_number: iq.question_number.clone(),
            question_type: iq.question_type.clone(),
            question_text: iq.question_text.clone(),
            options: iq.options.clone(),
            correct_answer: iq.correct_answer.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::bank::{QuestionBank, QuestionRepository};
    use chrono::Utc;

    fn q(number: &str, text: &str) -> Question {
        Question {
            question_number: number.to_string(),
            question_type: "多选题".to_string(),
            question_text: text.to_string(),
            options: [("A", "x"), ("B", "y")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            correct_answer: "AB".to_string(),
            global_correct_count: 0,
            global_error_count: 0,
            course: String::new(),
            original_chapter: 0,
            original_index: 0,
        }
    }

    #[test]
    fn quiz_ids_decode_back_to_the_source_question() {
        let bank = QuestionBank::from_chapters([(
            "c1",
            vec![vec![q("11", "a"), q("12", "b")], vec![q("21", "c")]],
        )]);
        let course = bank.course("c1").unwrap();
        let picked: Vec<&Question> = (0..2).flat_map(|c| course.chapter(c).unwrap()).collect();

        let out = to_output(&picked, 0, "c1");
        let ids: Vec<String> = out.iter().map(|o| o.quiz_question_id.to_string()).collect();
        assert_eq!(ids, vec!["quiz_c1_0_0", "quiz_c1_0_1", "quiz_c1_1_0"]);

        for (o, original) in out.iter().zip(&picked) {
            let key = QuizQuestionId::parse_quiz(&o.quiz_question_id.to_string()).unwrap();
            let resolved = bank.get(&key).unwrap();
            assert_eq!(resolved, *original);
            assert_eq!(o.correct_answer, resolved.correct_answer);
            assert_eq!(o.options, resolved.options);
            assert_eq!(o.original_question_number, resolved.question_number);
        }
    }

    #[test]
    fn display_numbers_follow_offset() {
        let questions = [q("1", "a"), q("2", "b")];
        let refs: Vec<&Question> = questions.iter().collect();
        let out = to_output(&refs, 10, "c1");
        assert_eq!(out[0].display_number, 11);
        assert_eq!(out[1].display_number, 12);
    }

    #[test]
    fn incorrect_ids_embed_list_position() {
        let entries: Vec<UserIncorrectQuestion> = [q("5", "a"), q("9", "b")]
            .iter()
            .map(|question| UserIncorrectQuestion::from_question(question, "C", Utc::now()))
            .collect();

        let out = incorrect_to_output(&entries, 0, "c1");
        assert_eq!(out[0].quiz_question_id.to_string(), "incorrect_c1_0_5_0");
        assert_eq!(out[1].quiz_question_id.to_string(), "incorrect_c1_0_9_1");
        assert_eq!(out[1].display_number, 2);
        assert_eq!(out[1].correct_answer, "AB");
    }
}
