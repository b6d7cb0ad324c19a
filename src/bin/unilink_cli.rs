//!
//! UniLink client CLI
//! ------------------
//! Interactive demo client for the UniLink API: log in as a student or an
//! admin, browse the feed/marketplace/friends/conversations and watch
//! realtime events, all through the same session core the app embeds.

use std::env;
use std::io::{self, Write};

use anyhow::Result;

use unilink_client::auth::{AuthManager, Credentials};
use unilink_client::config::ClientConfig;
use unilink_client::models::Role;
use unilink_client::realtime::ChannelState;
use unilink_client::store::TokenStore;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--base <url>] [--store <dir>] [--student-id <id> --password <p>] [--email <e> --password <p>]\n\nFlags:\n  --base <url>         API base URL (default: http://localhost:8080, or UNILINK_API_BASE)\n  --store <dir>        Directory for the persisted credential record (default: in-memory)\n  --student-id <id>    Log in as a student on startup\n  --email <e>          Log in as an admin on startup\n  --password <p>       Password for the startup login\n  -h, --help           Show this help\n\nInteractive commands:\n  login <studentId> <password>     student login\n  admin-login <email> <password>   admin login\n  logout                           end the session\n  status                           show session and channel state\n  feed                             print the announcement feed\n  listings                         print marketplace listings\n  friends                          print current friends\n  conversations                    print conversation list\n  listen <seconds>                 print realtime events for a while\n  help                             show this help\n  quit | exit                      leave"
    );
}

fn main() -> Result<()> {
    println!(
        r"  __  __      _ __    _       __
 / / / /___  (_) /   (_)___  / /__
/ / / / __ \/ / /   / / __ \/ //_/
/ /_/ / / / / / /___/ / / / / ,<
\____/_/ /_/_/_____/_/_/ /_/_/|_|
        Client Console"
    );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut base: Option<String> = None;
    let mut store_dir: Option<String> = None;
    let mut student_id: Option<String> = None;
    let mut email: Option<String> = None;
    let mut password: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--base" => {
                if i + 1 >= args.len() { eprintln!("--base requires a value"); print_usage(&program); std::process::exit(2); }
                base = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--store" => {
                if i + 1 >= args.len() { eprintln!("--store requires a value"); print_usage(&program); std::process::exit(2); }
                store_dir = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--student-id" => {
                if i + 1 >= args.len() { eprintln!("--student-id requires a value"); print_usage(&program); std::process::exit(2); }
                student_id = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--email" => {
                if i + 1 >= args.len() { eprintln!("--email requires a value"); print_usage(&program); std::process::exit(2); }
                email = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--password" => {
                if i + 1 >= args.len() { eprintln!("--password requires a value"); print_usage(&program); std::process::exit(2); }
                password = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            other => {
                eprintln!("unknown flag: {}", other);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let config = match base {
        Some(b) => ClientConfig::new(&b).map_err(|e| anyhow::anyhow!("{}", e))?,
        None => ClientConfig::from_env(),
    };
    let store = match store_dir {
        Some(dir) => TokenStore::on_disk(dir),
        None => TokenStore::in_memory(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let mgr = AuthManager::new(config, store);

    // Restore any persisted session before taking commands.
    let state = rt.block_on(mgr.restore());
    if let Some(session) = state.session() {
        println!("restored session: {} ({})", session.user.name, session.user.role);
    }

    // Optional one-shot login from flags.
    if let Some(pass) = password {
        let creds = if let Some(id) = student_id {
            Some(Credentials::Student { student_id: id, password: pass })
        } else {
            email.map(|e| Credentials::Admin { email: e, password: pass })
        };
        if let Some(creds) = creds {
            match rt.block_on(mgr.login(creds)) {
                Ok(nav) => println!("logged in; next stop {}", nav.path()),
                Err(e) => eprintln!("login failed: {}", e),
            }
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    println!("unilink console. Type 'help' for commands.");
    loop {
        input.clear();
        print!("> ");
        let _ = stdout.flush();
        if stdin.read_line(&mut input).is_err() { break; }
        let line = input.trim();
        if line.is_empty() { continue; }
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        match cmd {
            "quit" | "exit" => break,
            "help" => print_usage(&program),
            "login" => {
                let (id, pass) = (parts.next(), parts.next());
                match (id, pass) {
                    (Some(id), Some(pass)) => {
                        let creds = Credentials::Student { student_id: id.into(), password: pass.into() };
                        match rt.block_on(mgr.login(creds)) {
                            Ok(nav) => println!("ok; next stop {}", nav.path()),
                            Err(e) => eprintln!("login failed: {}", e),
                        }
                    }
                    _ => eprintln!("usage: login <studentId> <password>"),
                }
            }
            "admin-login" => {
                let (mail, pass) = (parts.next(), parts.next());
                match (mail, pass) {
                    (Some(mail), Some(pass)) => {
                        let creds = Credentials::Admin { email: mail.into(), password: pass.into() };
                        match rt.block_on(mgr.login(creds)) {
                            Ok(nav) => println!("ok; next stop {}", nav.path()),
                            Err(e) => eprintln!("login failed: {}", e),
                        }
                    }
                    _ => eprintln!("usage: admin-login <email> <password>"),
                }
            }
            "logout" => {
                let nav = mgr.logout();
                println!("logged out; next stop {}", nav.path());
            }
            "status" => {
                let session = mgr.session();
                match session.user() {
                    Some(u) => {
                        println!("user: {} (id={}, role={})", u.name, u.id, u.role);
                        println!("college admin or above: {}", mgr.has_role(Role::CollegeAdmin));
                    }
                    None => println!("anonymous"),
                }
                println!("channel: {:?}", mgr.channel().state());
            }
            "feed" => match rt.block_on(mgr.api().feed()) {
                Ok(page) => {
                    println!("{} announcement(s)", page.total);
                    for a in page.announcements {
                        println!("  [{}] {} by {}", a.priority, a.title, a.author_name);
                    }
                }
                Err(e) => eprintln!("feed failed: {}", e),
            },
            "listings" => match rt.block_on(mgr.api().listings()) {
                Ok(listings) => {
                    for l in listings {
                        println!("  #{} {} ({:.2}) [{}]", l.id, l.title, l.price, l.status);
                    }
                }
                Err(e) => eprintln!("listings failed: {}", e),
            },
            "friends" => match rt.block_on(mgr.api().friends()) {
                Ok(friends) => {
                    for f in friends {
                        println!("  {} ({})", f.friend.name, f.friend.student_id);
                    }
                }
                Err(e) => eprintln!("friends failed: {}", e),
            },
            "conversations" => match rt.block_on(mgr.api().conversations()) {
                Ok(convos) => {
                    for c in convos {
                        println!("  [{}] {}: {}", c.conversation_id, c.name, c.last_message);
                    }
                }
                Err(e) => eprintln!("conversations failed: {}", e),
            },
            "listen" => {
                let secs: u64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30);
                if mgr.channel().state() == ChannelState::Closed {
                    eprintln!("channel is closed; log in first");
                    continue;
                }
                println!("listening for {}s (ctrl-c to abort the console)...", secs);
                let sub = mgr.channel().add_listener(|ev| {
                    println!("  event {:?}: {}", ev.kind, ev.payload);
                });
                rt.block_on(tokio::time::sleep(std::time::Duration::from_secs(secs)));
                sub.cancel();
            }
            other => eprintln!("unknown command: {} (try 'help')", other),
        }
    }

    // Drop the channel cleanly so no event fires into a dead console.
    mgr.channel().close();
    Ok(())
}
