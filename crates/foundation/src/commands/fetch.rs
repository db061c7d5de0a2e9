//! One-shot reads: environment, configuration, variable.

use foundation_core::{Foundation, Value};

use crate::cli::{GlobalOpts, VariableArgs};
use crate::error::CliError;
use crate::output;

pub async fn environment(client: &Foundation, global: &GlobalOpts) -> Result<(), CliError> {
    let env = client.get_environment().await?;
    output::print_line(&output::render(global.output, &env))?;
    Ok(())
}

pub async fn configuration(client: &Foundation, global: &GlobalOpts) -> Result<(), CliError> {
    let config = client.get_configuration().await?;
    output::print_line(&output::render(global.output, &config))?;
    Ok(())
}

pub async fn variable(
    client: &Foundation,
    args: VariableArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let fallback = args
        .fallback
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()?;

    let value = client
        .get_variable(&args.name, args.uid.as_deref(), fallback)
        .await?;

    // No value and no fallback prints JSON null.
    let value = value.unwrap_or(Value::Null);
    output::print_line(&output::render(global.output, &value))?;
    Ok(())
}
