use cogex_core::{AnswerMode, TextEntry};
use cogex_experiment::{Responder, Response, ResponseRequest};
use cogex_timing::Timer;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::time::Duration;

/// Answers at a random time with a random choice; sometimes too late.
pub struct SimulatedParticipant<T: Timer, R: Rng> {
    timer: T,
    rng: R,
}

impl<T: Timer, R: Rng> SimulatedParticipant<T, R> {
    pub fn new(timer: T, rng: R) -> Self {
        Self { timer, rng }
    }

    fn pick(&mut self, choices: &[String]) -> Option<String> {
        choices.choose(&mut self.rng).cloned()
    }
}

impl<T: Timer, R: Rng> Responder for SimulatedParticipant<T, R> {
    fn respond(&mut self, request: &ResponseRequest<'_>) -> Option<Response> {
        let window = request.window;
        let rt = Duration::from_millis(200).max(window.mul_f64(self.rng.random_range(0.1..1.2)));
        if rt > window {
            self.timer.sleep(window);
            return None;
        }
        self.timer.sleep(rt);

        let answer = match request.mode {
            AnswerMode::Keyboard | AnswerMode::Mouse => self.pick(request.choices)?,
            AnswerMode::Text => {
                let allowed: Vec<char> = request
                    .choices
                    .iter()
                    .filter_map(|c| c.chars().next())
                    .collect();
                let mut entry = TextEntry::new(allowed, request.max_len);
                let len = self.rng.random_range(1..=request.max_len.max(1));
                for _ in 0..len {
                    if let Some(symbol) = self.pick(request.choices) {
                        symbol.chars().for_each(|c| {
                            entry.push(c);
                        });
                    }
                }
                entry.text().to_string()
            }
        };
        Some(Response { answer, rt })
    }
}
