use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use feedline_sdk::{
    Chat, Feedline, FileKvStore, Message, Post, PostDraft, PostId, Profile, PublicUser, Timestamp,
    User,
};

use crate::cli::*;
use crate::config::CliConfig;

type App = Feedline<FileKvStore>;

pub async fn run_command(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    if !config.color {
        colored::control::set_override(false);
    }
    let store = Arc::new(FileKvStore::open(config.data_dir.clone()));
    let mut app = Feedline::open(store)
        .await
        .with_context(|| format!("cannot open store at {}", config.data_dir.display()))?;

    let result = dispatch(&mut app, cli.command, &config);

    app.flush().await;
    let failed = app.write_stats().failed;
    if failed > 0 {
        eprintln!(
            "{} {failed} write(s) did not reach {}; changes may be lost",
            "warning:".yellow().bold(),
            config.data_dir.display()
        );
    }
    result
}

fn dispatch(app: &mut App, command: Command, config: &CliConfig) -> anyhow::Result<()> {
    let json = config.format == OutputFormat::Json;
    match command {
        Command::Register(args) => {
            let user = app.register(&args.username, &args.email, &args.password)?;
            if json { return print_json(&PublicUser::from(&user)); }
            println!("{} Registered and signed in as {}", "✓".green().bold(), user.username.bold());
            println!("  Id: {}", user.id.as_str().cyan());
            Ok(())
        }
        Command::Login(args) => {
            let user = app.login(&args.email, &args.password)?;
            if json { return print_json(&PublicUser::from(&user)); }
            println!("{} Signed in as {}", "✓".green().bold(), user.username.bold());
            Ok(())
        }
        Command::Logout => {
            app.logout();
            if json { return print_json(&serde_json::json!({ "signedIn": false })); }
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => cmd_whoami(app, json),
        Command::Post(args) => cmd_post(app, args, json),
        Command::Like(args) => {
            let post = PostId::parse(&args.post)?;
            let liked = app.toggle_like(&post)?;
            if json { return print_json(&serde_json::json!({ "liked": liked })); }
            if liked {
                println!("{} Liked {}", "♥".red(), post.as_str().yellow());
            } else {
                println!("Unliked {}", post.as_str().yellow());
            }
            Ok(())
        }
        Command::Comment(args) => {
            let post = PostId::parse(&args.post)?;
            let id = app.add_comment(&post, &args.content)?;
            if json { return print_json(&serde_json::json!({ "id": id })); }
            println!("{} Commented on {}", "✓".green(), post.as_str().yellow());
            Ok(())
        }
        Command::Feed(args) => {
            let limit = args.limit.unwrap_or(config.feed_limit);
            let posts: Vec<&Post> = app.feed().iter().take(limit).collect();
            if json { return print_json(&posts); }
            if posts.is_empty() {
                println!("No posts yet.");
            }
            for post in posts {
                print_post(post);
            }
            Ok(())
        }
        Command::Friend(args) => cmd_friend(app, args.action.unwrap_or(FriendAction::List), json),
        Command::Users(args) => {
            let hits: Vec<PublicUser> = app
                .search_users(&args.query)?
                .into_iter()
                .map(PublicUser::from)
                .collect();
            if json { return print_json(&hits); }
            if hits.is_empty() {
                println!("No users match {:?}.", args.query);
            }
            let me = app.current_user().cloned();
            for user in &hits {
                let mark = match &me {
                    Some(me) if me.follows(&user.id) => "friend".green().to_string(),
                    _ => String::new(),
                };
                println!("{}  {}  {}  {}", user.username.bold(), user.email, user.id.as_str().dimmed(), mark);
            }
            Ok(())
        }
        Command::Chats => {
            let chats = app.chats()?;
            if json { return print_json(&chats); }
            if chats.is_empty() {
                println!("No conversations. Add a friend to start one.");
            }
            for chat in &chats {
                print_chat(chat);
            }
            Ok(())
        }
        Command::Chat(args) => {
            let peer = app.resolve_user(&args.user)?.clone();
            let transcript = app.open_chat(&peer.id)?;
            if json { return print_json(&transcript); }
            println!("Conversation with {}", peer.username.bold());
            if transcript.is_empty() {
                println!("  (no messages)");
            }
            for message in &transcript {
                print_message(message, &peer);
            }
            Ok(())
        }
        Command::Send(args) => {
            let peer = app.resolve_user(&args.user)?.clone();
            let id = app.send_message(&peer.id, &args.content)?;
            if json { return print_json(&serde_json::json!({ "id": id })); }
            println!("{} Sent to {}", "✓".green(), peer.username.bold());
            Ok(())
        }
        Command::Avatar(args) => {
            let avatar = if args.clear { None } else { args.url };
            let cleared = avatar.is_none();
            app.update_avatar(avatar)?;
            if json { return print_json(&serde_json::json!({ "avatar": !cleared })); }
            if cleared {
                println!("{} Avatar cleared", "✓".green());
            } else {
                println!("{} Avatar updated", "✓".green());
            }
            Ok(())
        }
        Command::Profile(args) => {
            let id = match &args.user {
                Some(handle) => app.resolve_user(handle)?.id.clone(),
                None => app.session().require()?.id.clone(),
            };
            let profile = app.profile(&id)?;
            if json { return print_json(&profile); }
            print_profile(&profile);
            Ok(())
        }
    }
}

fn cmd_whoami(app: &App, json: bool) -> anyhow::Result<()> {
    let user = app.current_user();
    if json {
        return print_json(&user.map(PublicUser::from));
    }
    match user {
        Some(user) => {
            println!("{} <{}>", user.username.bold(), user.email);
            println!("  Id: {}", user.id.as_str().cyan());
            println!("  Friends: {}", user.friends.len());
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

fn cmd_post(app: &mut App, args: PostArgs, json: bool) -> anyhow::Result<()> {
    let mut draft = PostDraft::new(args.content);
    if let Some(url) = args.image {
        draft = draft.with_image(url);
    } else if let Some(url) = args.video {
        draft = draft.with_video(url);
    }
    let id = app.create_post(draft)?;
    if json {
        return print_json(&serde_json::json!({ "id": id }));
    }
    println!("{} Posted {}", "✓".green().bold(), id.as_str().yellow());
    Ok(())
}

fn cmd_friend(app: &mut App, action: FriendAction, json: bool) -> anyhow::Result<()> {
    match action {
        FriendAction::Add { user } => {
            let target = app.resolve_user(&user)?.clone();
            app.add_friend(&target.id)?;
            if json { return print_json(&PublicUser::from(&target)); }
            println!("{} Added {} as a friend", "✓".green(), target.username.bold());
        }
        FriendAction::Remove { user } => {
            let target = app.resolve_user(&user)?.clone();
            app.remove_friend(&target.id)?;
            if json { return print_json(&PublicUser::from(&target)); }
            println!("Removed {} from friends", target.username.bold());
        }
        FriendAction::List => {
            let friends: Vec<PublicUser> =
                app.friends()?.into_iter().map(PublicUser::from).collect();
            if json { return print_json(&friends); }
            if friends.is_empty() {
                println!("No friends yet.");
            }
            for friend in &friends {
                println!("{}  {}", friend.username.bold(), friend.id.as_str().dimmed());
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_time(ts: Timestamp) -> String {
    i64::try_from(ts.as_millis())
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn print_post(post: &Post) {
    println!(
        "{}  {}  {}",
        post.author_username.bold(),
        format_time(post.created_at).dimmed(),
        post.id.as_str().yellow()
    );
    if !post.content.is_empty() {
        println!("  {}", post.content);
    }
    if let Some(media) = &post.media {
        let url: String = media.url.chars().take(60).collect();
        println!("  [{}] {}", media.kind.to_string().cyan(), url.dimmed());
    }
    println!(
        "  {} {}  {} {}",
        "♥".red(),
        post.like_count(),
        "comments:".dimmed(),
        post.comments.len()
    );
    for comment in &post.comments {
        println!("    {} {}", format!("{}:", comment.author_username).bold(), comment.content);
    }
    println!();
}

fn print_chat(chat: &Chat) {
    let unread = if chat.unread_count > 0 {
        format!(" ({} unread)", chat.unread_count).green().bold().to_string()
    } else {
        String::new()
    };
    let last = chat.last_message.as_deref().unwrap_or("no messages yet");
    println!("{}{}  {}", chat.peer_username.bold(), unread, last.dimmed());
}

fn print_message(message: &Message, peer: &User) {
    let who = if message.sender_id == peer.id {
        peer.username.cyan().bold()
    } else {
        "me".green().bold()
    };
    println!("  {} {}  {}", format_time(message.created_at).dimmed(), who, message.content);
}

fn print_profile(profile: &Profile) {
    let user = &profile.user;
    println!("{} <{}>", user.username.bold(), user.email);
    if let Some(bio) = &user.bio {
        println!("  {}", bio);
    }
    println!(
        "  Posts: {}  Friends: {}",
        profile.stats.post_count, profile.stats.friend_count
    );
    println!();
    for post in &profile.posts {
        print_post(post);
    }
}
