use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docflow",
    version,
    about = "Work with DocFlow documents from the command line",
    long_about = "Upload drafts, send them for approval, sign and verify documents against the DocFlow services"
)]
pub struct Cli {
    /// Configuration file (defaults to ./docflow.toml or the user config dir)
    #[arg(short, long, global = true, env = "DOCFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with a token, log out or reload the profile
    #[command(subcommand)]
    Session(SessionCommands),

    /// Show the logged in user
    Whoami,

    /// List your drafts and sent documents
    Documents {
        /// Only documents carrying all of these tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Upload a .pdf, .docx or .doc file as a draft
    Upload {
        file: PathBuf,

        /// Display name, defaults to the file name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Send a draft for approval
    Approve {
        document_id: String,

        /// Signer email, looked up in the directory
        #[arg(short, long = "signer", value_name = "EMAIL")]
        signers: Vec<String>,

        /// Signer IIN, looked up in the directory
        #[arg(long = "iin", value_name = "IIN")]
        iins: Vec<String>,

        /// Deputy for a signer
        #[arg(long = "deputy", value_name = "SIGNER_EMAIL=DEPUTY_EMAIL")]
        deputies: Vec<String>,

        /// Do not sign yourself
        #[arg(long)]
        no_self: bool,

        /// Signers act one after another in the given order
        #[arg(long)]
        sequential: bool,

        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Expiration, added to the current time
        #[arg(long, default_value_t = 0)]
        years: u32,
        #[arg(long, default_value_t = 0)]
        months: u32,
        #[arg(long, default_value_t = 0)]
        days: u32,
    },

    /// Show who has to sign a document and who may sign now
    Signers { document_id: String },

    /// Sign a document with a local certificate and key
    Sign {
        /// Document id, or a sign link path such as /sign/1a2b?guest=...
        target: String,

        /// X.509 certificate (PEM)
        #[arg(long, env = "DOCFLOW_CERT")]
        cert: PathBuf,

        /// PKCS#8 private key (PEM)
        #[arg(long, env = "DOCFLOW_KEY")]
        key: PathBuf,

        /// Sign as a guest with this email instead of the logged in user
        #[arg(long)]
        guest: Option<String>,

        /// Name of the signer the guest stands in for
        #[arg(long, requires = "guest")]
        deputy_of: Option<String>,
    },

    /// Verify a signed file and compare it with its approval
    Verify { file: PathBuf },

    /// Manage your tag catalogue
    #[command(subcommand)]
    Tags(TagCommands),

    /// Fill document templates
    #[command(subcommand)]
    Templates(TemplateCommands),
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Store an access token issued by the auth service
    Login {
        #[arg(long, env = "DOCFLOW_TOKEN", hide_env_values = true)]
        token: String,
    },
    Logout,
    /// Reload the cached profile
    Refresh,
    /// Edit the profile and optionally change the password
    Profile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        organization: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        iin: Option<String>,

        /// Current password, required to set a new one
        #[arg(long, requires = "new_password")]
        old_password: Option<String>,
        #[arg(long, requires_all = ["old_password", "confirm_password"])]
        new_password: Option<String>,
        #[arg(long, requires = "new_password")]
        confirm_password: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TagCommands {
    List,
    Add { tag: String },
    Delete { tag: String },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    List,
    /// Show the fields a template expects
    Fields { template_id: String },
    /// Fill a template and write the produced document
    Fill {
        template_id: String,

        #[arg(long = "value", value_name = "FIELD=VALUE")]
        values: Vec<String>,

        #[arg(short, long)]
        output: PathBuf,
    },
}
