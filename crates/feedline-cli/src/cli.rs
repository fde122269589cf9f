use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "feedline",
    about = "Feedline: a local-first social feed",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (defaults to the config file, then text)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Directory holding the Feedline store
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/feedline.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Register(RegisterArgs),
    /// Sign in with email and password
    Login(LoginArgs),
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Publish a post
    Post(PostArgs),
    /// Like or unlike a post
    Like(LikeArgs),
    /// Comment on a post
    Comment(CommentArgs),
    /// Show the feed, newest first
    Feed(FeedArgs),
    /// Manage your friend list
    Friend(FriendArgs),
    /// Search users by username or email
    Users(UsersArgs),
    /// List conversations with friends
    Chats,
    /// Open a conversation (marks it read)
    Chat(ChatArgs),
    /// Send a direct message
    Send(SendArgs),
    /// Set or clear your avatar
    Avatar(AvatarArgs),
    /// Show a profile
    Profile(ProfileArgs),
}

#[derive(Args)]
pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Args)]
pub struct LoginArgs {
    pub email: String,
    pub password: String,
}

#[derive(Args)]
pub struct PostArgs {
    #[arg(default_value = "")]
    pub content: String,
    #[arg(long, conflicts_with = "video")]
    pub image: Option<String>,
    #[arg(long)]
    pub video: Option<String>,
}

#[derive(Args)]
pub struct LikeArgs {
    pub post: String,
}

#[derive(Args)]
pub struct CommentArgs {
    pub post: String,
    pub content: String,
}

#[derive(Args)]
pub struct FeedArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct FriendArgs {
    #[command(subcommand)]
    pub action: Option<FriendAction>,
}

#[derive(Subcommand)]
pub enum FriendAction {
    Add { user: String },
    Remove { user: String },
    List,
}

#[derive(Args)]
pub struct UsersArgs {
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Args)]
pub struct ChatArgs {
    pub user: String,
}

#[derive(Args)]
pub struct SendArgs {
    pub user: String,
    pub content: String,
}

#[derive(Args)]
pub struct AvatarArgs {
    #[arg(required_unless_present = "clear")]
    pub url: Option<String>,
    #[arg(long, conflicts_with = "url")]
    pub clear: bool,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// Username, email, or id (defaults to you)
    pub user: Option<String>,
}
