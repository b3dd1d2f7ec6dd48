use rand::Rng;

/// Canned string transforms offered to the user for a selected run of text.
///
/// All three preserve the character count of their input. Randomize draws a
/// fresh unbiased coin per character and is not reproducible across calls;
/// the other two are pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Capitalize,
    Randomize,
    Reverse,
}

impl Transform {
    /// Menu order.
    pub const ALL: [Transform; 3] = [Transform::Capitalize, Transform::Randomize, Transform::Reverse];

    pub fn label(&self) -> &'static str {
        match self {
            Transform::Capitalize => "Capitalize",
            Transform::Randomize => "Randomize",
            Transform::Reverse => "Reverse",
        }
    }

    pub fn apply(&self, input: &str) -> String {
        match self {
            Transform::Capitalize => input.chars().flat_map(char::to_uppercase).collect(),
            Transform::Randomize => {
                let mut rng = rand::thread_rng();
                input
                    .chars()
                    .map(|c| {
                        if c == ' ' {
                            ' '
                        } else if rng.gen_bool(0.5) {
                            '0'
                        } else {
                            '1'
                        }
                    })
                    .collect()
            }
            // Char-level reversal: grapheme clusters spanning multiple chars
            // come out mis-ordered.
            Transform::Reverse => input.chars().rev().collect(),
        }
    }
}
