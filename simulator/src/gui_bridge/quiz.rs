use std::io::{BufRead, Write};
use trajcore::processing::TrajectorySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct,
    Incorrect,
    Missing,
    NotNumeric,
}

impl QuizOutcome {
    pub fn message(self) -> &'static str {
        match self {
            QuizOutcome::Correct => "Correct value of horizontal distance entered!",
            QuizOutcome::Incorrect => "The value of horizontal distance entered is incorrect.",
            QuizOutcome::Missing => "'Horizontal Distance' is a required field.",
            QuizOutcome::NotNumeric => {
                "The value of horizontal distance should be numerical. \
                 Give your answer accurate to two decimal places!"
            }
        }
    }
}

/// Asks the user for the horizontal range; only the exact two-decimal
/// rendering of the derived range is accepted.
pub struct RangeQuiz {
    summary: TrajectorySummary,
    expected: String,
}

impl RangeQuiz {
    /// `horizontal_range` is the unrounded range the summary was built from.
    pub fn new(summary: TrajectorySummary, horizontal_range: f64) -> Self {
        Self {
            expected: format!("{:.2}", horizontal_range),
            summary,
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// The answer is compared verbatim; surrounding whitespace still parses
    /// as a number but is not the expected rendering.
    pub fn check(&self, answer: &str) -> QuizOutcome {
        if answer.is_empty() {
            QuizOutcome::Missing
        } else if answer.trim().parse::<f64>().is_err() {
            QuizOutcome::NotNumeric
        } else if answer == self.expected {
            QuizOutcome::Correct
        } else {
            QuizOutcome::Incorrect
        }
    }

    pub fn question(&self) -> String {
        format!(
            "Calculate the horizontal distance travelled by the projectile.\n\
             Give your answer accurate to two decimal places.\n\n\
             Initial angle = {:.2} degrees\n\
             Initial velocity = {:.2} m/s\n\
             Time of flight = {:.2} s\n",
            self.summary.angle_deg, self.summary.initial_speed, self.summary.time_of_flight
        )
    }

    pub fn closing_summary(&self) -> String {
        format!(
            "Initial angle = {:.2} degrees\n\
             Initial velocity = {:.2} m/s\n\
             Predicted horizontal distance = {} m\n\
             Time of flight = {:.2} s",
            self.summary.angle_deg,
            self.summary.initial_speed,
            self.expected,
            self.summary.time_of_flight
        )
    }

    /// Interactive loop; `exit` or end of input gives up. Returns whether the
    /// range was answered correctly.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> anyhow::Result<bool> {
        writeln!(output, "{}", self.question())?;
        let mut line = String::new();
        let answered = loop {
            write!(output, "Horizontal Distance (or 'exit'): ")?;
            output.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break false;
            }
            let answer = line.trim_end_matches(&['\r', '\n'][..]);
            if answer.eq_ignore_ascii_case("exit") {
                break false;
            }
            let outcome = self.check(answer);
            writeln!(output, "{}", outcome.message())?;
            if outcome == QuizOutcome::Correct {
                break true;
            }
        };
        writeln!(output, "\n{}", self.closing_summary())?;
        Ok(answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn quiz() -> RangeQuiz {
        RangeQuiz::new(
            TrajectorySummary {
                angle_deg: 40.0,
                initial_speed: 8.0,
                time_of_flight: 1.05,
                horizontal_range: 6.42,
            },
            6.4197,
        )
    }

    #[test]
    fn answer_must_match_two_decimal_rendering() {
        let quiz = quiz();
        assert_eq!(quiz.expected(), "6.42");
        assert_eq!(quiz.check("6.42"), QuizOutcome::Correct);
        assert_eq!(quiz.check(" 6.42"), QuizOutcome::Incorrect);
        assert_eq!(quiz.check("   "), QuizOutcome::NotNumeric);
        assert_eq!(quiz.check("6.420"), QuizOutcome::Incorrect);
        assert_eq!(quiz.check("6.4"), QuizOutcome::Incorrect);
        assert_eq!(quiz.check(""), QuizOutcome::Missing);
        assert_eq!(quiz.check("six"), QuizOutcome::NotNumeric);
    }

    #[test]
    fn interactive_quiz_stops_on_correct_answer() {
        let mut input = Cursor::new("\nfar\n7.00\n6.42\r\n");
        let mut output = Vec::new();
        assert!(quiz().run(&mut input, &mut output).unwrap());
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("required field"));
        assert!(transcript.contains("should be numerical"));
        assert!(transcript.contains("is incorrect"));
        assert!(transcript.contains("Predicted horizontal distance = 6.42 m"));
    }

    #[test]
    fn interactive_quiz_can_be_abandoned() {
        let mut input = Cursor::new("exit\n");
        let mut output = Vec::new();
        assert!(!quiz().run(&mut input, &mut output).unwrap());
    }
}
