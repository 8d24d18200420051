use cliclack::{input, password};

/// Read `env_name`, prompting for the value when it is unset.
pub fn get_env_value_or_input(
    env_name: &str,
    input_prompt: &str,
    mask: bool,
) -> std::io::Result<String> {
    if let Ok(value) = std::env::var(env_name) {
        return Ok(value);
    }

    if mask {
        password(input_prompt).mask('▪').interact()
    } else {
        input(input_prompt).interact()
    }
}
