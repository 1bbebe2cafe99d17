use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::QuestionsArgs;
use crate::commands::resolve_config;
use crate::report::{ColumnPolicy, SqliteFormSchemaFetcher, column_key};

pub fn run(args: QuestionsArgs) -> Result<()> {
    let config = resolve_config(&args.store)?;
    let schema = SqliteFormSchemaFetcher::new(&config);
    let policy = ColumnPolicy::from_config(&config);

    let questions = schema
        .lookup(&args.form)
        .with_context(|| format!("failed to look up questions for form `{}`", args.form))?;
    let eligible = policy.eligible_columns(&questions);
    info!(form = %args.form, questions = questions.len(), charted = eligible.len(), "listed questions");

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Questions for {}:", args.form)?;
    writeln!(output, "  -\t{}\tcharted for every form", policy.leading_column())?;
    for (index, question) in questions.iter().enumerate() {
        let column = column_key(question);
        let marker = if policy.is_skipped(&column) {
            "skipped"
        } else {
            "charted"
        };
        writeln!(output, "  {}.\t{column}\t{marker}", index + 1)?;
    }
    writeln!(output, "Charted columns: {}", eligible.join(", "))?;
    output.flush()?;
    Ok(())
}
