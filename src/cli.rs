use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use crate::display::{
    kpi_table, policy_heatmap, print_error, print_section, state_table, summary_text,
    DEFAULT_MAX_DISPLAY,
};
use crate::engine::solve_parameters;
use crate::error::{SolverError, SolverOutcome};
use crate::params::GameParameters;
use crate::summary::StrategySummary;

#[derive(Parser)]
#[command(
    name = "stopsolve",
    version = "1.0.0",
    about = "Optimal stopping for draw-without-replacement prize games."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ParamArgs {
    /// Winning tokens remaining (R0)
    #[arg(required_unless_present = "params")]
    r0: Option<usize>,
    /// Non-winning tokens remaining (B0)
    #[arg(required_unless_present = "params")]
    b0: Option<usize>,
    /// Prize paid on a winning draw
    #[arg(required_unless_present = "params")]
    payout: Option<f64>,
    /// Fee per grab attempt
    #[arg(required_unless_present = "params")]
    cost: Option<f64>,
    /// Consolation paid on a non-winning draw
    #[arg(long)]
    q: Option<f64>,
    /// Tokens obtained per successful grab
    #[arg(long)]
    scratch_per_grab: Option<f64>,
    /// Grabs needed on average per token
    #[arg(long)]
    grabs_per_scratch: Option<f64>,
    /// JSON parameter file (R0, B0, payout_per_win, cost_per_grab, ...)
    #[arg(long, conflicts_with_all = ["r0", "b0", "payout", "cost"])]
    params: Option<PathBuf>,
}

impl ParamArgs {
    /// Build validated parameters. Flags override values read from `--params`.
    fn to_parameters(&self) -> SolverOutcome<GameParameters> {
        let mut params = match &self.params {
            Some(path) => GameParameters::from_file(path)?,
            None => GameParameters::new(
                self.r0.ok_or(SolverError::MissingParameter("R0"))?,
                self.b0.ok_or(SolverError::MissingParameter("B0"))?,
                self.payout.ok_or(SolverError::MissingParameter("payout"))?,
                self.cost.ok_or(SolverError::MissingParameter("cost"))?,
            ),
        };
        if let Some(q) = self.q {
            params.q = q;
        }
        if let Some(s) = self.scratch_per_grab {
            params.scratch_per_grab = s;
        }
        if let Some(g) = self.grabs_per_scratch {
            params.grabs_per_scratch = g;
        }
        params.validate()?;
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the game and show the start-state recommendation
    Solve {
        #[command(flatten)]
        params: ParamArgs,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Also draw the policy heat map
        #[arg(short, long)]
        matrix: bool,
        /// Largest R and B shown in the heat map
        #[arg(long, default_value_t = DEFAULT_MAX_DISPLAY)]
        max_display: usize,
    },
    /// Show the solved values for a single state (R, B)
    State {
        /// Winning tokens left in the queried state
        r: usize,
        /// Non-winning tokens left in the queried state
        b: usize,
        #[command(flatten)]
        params: ParamArgs,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

fn dispatch(cli: Cli) {
    let outcome = match cli.command {
        Commands::Solve {
            params,
            json,
            matrix,
            max_display,
        } => cmd_solve(&params, json, matrix, max_display),
        Commands::State { r, b, params } => cmd_state(r, b, &params),
    };

    if let Err(e) = outcome {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn cmd_solve(args: &ParamArgs, json: bool, matrix: bool, max_display: usize) -> SolverOutcome<()> {
    let params = args.to_parameters()?;
    debug!(?params, "parsed parameters");
    let result = solve_parameters(&params)?;

    if json {
        println!("{}", result.to_json()?);
        return Ok(());
    }

    println!();
    println!(
        "  {} R0={} B0={} | payout {} | cost/grab {} | q {}",
        "Solve".bold(),
        params.r0,
        params.b0,
        params.payout_per_win,
        params.cost_per_grab,
        params.q,
    );
    println!("{}", kpi_table(&result));

    let summary = StrategySummary::from_result(&result);
    print_section("Strategy", &summary_text(&summary));

    if matrix {
        println!();
        println!("{}", policy_heatmap(&result.policy, max_display));
    }
    println!();
    Ok(())
}

fn cmd_state(r: usize, b: usize, args: &ParamArgs) -> SolverOutcome<()> {
    let params = args.to_parameters()?;
    let result = solve_parameters(&params)?;
    let state = result.state(r, b)?;

    println!();
    println!("{}", state_table(r, b, &state));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn positional_parameters_with_flags() {
        let cli = parse(&["stopsolve", "solve", "3", "10", "100", "10", "--q", "2.5"]);
        let Commands::Solve { params, json, .. } = cli.command else {
            panic!("expected solve");
        };
        assert!(!json);
        let p = params.to_parameters().unwrap();
        assert_eq!(p, GameParameters::new(3, 10, 100.0, 10.0).with_consolation(2.5));
    }

    #[test]
    fn missing_positionals_rejected() {
        assert!(Cli::try_parse_from(["stopsolve", "solve", "3", "10"]).is_err());
    }

    #[test]
    fn params_file_with_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"R0": 2, "B0": 5, "payout_per_win": 40, "cost_per_grab": 8, "q": 1}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&["stopsolve", "solve", "--params", &path, "--grabs-per-scratch", "2"]);
        let Commands::Solve { params, .. } = cli.command else {
            panic!("expected solve");
        };
        let p = params.to_parameters().unwrap();
        assert_eq!(p.r0, 2);
        assert_eq!(p.q, 1.0);
        assert_eq!(p.grabs_per_scratch, 2.0);
    }

    #[test]
    fn params_file_conflicts_with_positionals() {
        assert!(Cli::try_parse_from([
            "stopsolve", "solve", "1", "1", "1", "1", "--params", "p.json"
        ])
        .is_err());
    }

    #[test]
    fn oversized_pool_rejected() {
        let cli = parse(&["stopsolve", "solve", "501", "0", "100", "10"]);
        let Commands::Solve { params, .. } = cli.command else {
            panic!("expected solve");
        };
        assert!(matches!(
            params.to_parameters(),
            Err(SolverError::DimensionTooLarge { .. })
        ));
    }

    #[test]
    fn state_command_parses_coordinates_first() {
        let cli = parse(&["stopsolve", "state", "1", "2", "3", "4", "100", "10"]);
        let Commands::State { r, b, params } = cli.command else {
            panic!("expected state");
        };
        assert_eq!((r, b), (1, 2));
        assert_eq!(params.to_parameters().unwrap().b0, 4);
    }
}
