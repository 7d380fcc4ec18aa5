/// The fine-tuned model expects exactly these two lines.
pub fn build_prompt(archetype: &str, training_days: u8) -> String {
    format!("Archetype: {}\nTraining_Days: {}", archetype.trim(), training_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_shape() {
        assert_eq!(
            build_prompt("  Batman ", 4),
            "Archetype: Batman\nTraining_Days: 4"
        );
    }
}
