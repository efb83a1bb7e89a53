use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "parkit-payouts")]
#[command(about = "Parkit Payouts - payout ledger and Mercado Pago linking service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Withdrawal management commands
    #[command(subcommand)]
    Withdrawal(WithdrawalCommands),

    /// Run a credential/destination reconciliation pass
    Reconcile,

    /// Configuration validation
    Config,

    /// Print the OpenAPI document as JSON
    Openapi,
}

/// Operator commands that drive withdrawal state on behalf of the settlement
/// process.
#[derive(Subcommand)]
pub enum WithdrawalCommands {
    /// Mark a pending withdrawal as processing
    MarkProcessing {
        /// Withdrawal UUID
        #[arg(value_name = "WITHDRAWAL_ID")]
        withdrawal_id: Uuid,
    },

    /// Complete a withdrawal, settling the reserved funds
    ForceComplete {
        /// Withdrawal UUID
        #[arg(value_name = "WITHDRAWAL_ID")]
        withdrawal_id: Uuid,
    },

    /// Reject a withdrawal, returning the reserved funds
    ForceReject {
        /// Withdrawal UUID
        #[arg(value_name = "WITHDRAWAL_ID")]
        withdrawal_id: Uuid,

        /// Reason shown to the owner
        #[arg(long)]
        motivo: String,
    },

    /// Cancel a withdrawal, returning the reserved funds
    ForceCancel {
        /// Withdrawal UUID
        #[arg(value_name = "WITHDRAWAL_ID")]
        withdrawal_id: Uuid,
    },
}
