use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use carmarket::error::{Error, Result};
use carmarket::listings::{Listing, ListingRepository};
use carmarket::storage::ImageBlob;
use carmarket::submission::{Field, SubmitOutcome};
use carmarket::Marketplace;

#[derive(Parser, Debug)]
#[clap(name = "carmarket", version, about = "Browse and publish car listings")]
struct CliArgs {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every listing, newest first
    List,

    /// Find listings whose name starts with a prefix
    Search { prefix: String },

    /// Show one listing
    Show { id: String },

    /// Publish a new listing with photos
    Publish(PublishArgs),

    /// List your own listings, optionally deleting one
    Mine {
        #[clap(flatten)]
        login: LoginArgs,

        #[clap(long)]
        delete: Option<String>,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[clap(long, env = "CARMARKET_EMAIL")]
    email: String,

    #[clap(long, env = "CARMARKET_PASSWORD")]
    password: String,
}

#[derive(Args, Debug)]
struct PublishArgs {
    #[clap(flatten)]
    login: LoginArgs,

    #[clap(long)]
    name: String,
    #[clap(long)]
    model: String,
    #[clap(long)]
    year: String,
    #[clap(long)]
    km: String,
    #[clap(long)]
    price: String,
    #[clap(long)]
    city: String,
    #[clap(long)]
    whatsapp: String,
    #[clap(long)]
    description: String,

    /// JPEG or PNG file; repeat for more photos
    #[clap(long = "image", required = true)]
    images: Vec<PathBuf>,
}

fn print_row(listing: &Listing) {
    println!(
        "{:<38} {:<24} {:<10} {:>10} km  R$ {:<12} {}",
        listing.id, listing.name, listing.year, listing.odometer, listing.price, listing.city
    );
}

fn print_details(listing: &Listing) -> Result<()> {
    println!("{} {}", listing.name, listing.model);
    println!("  year:        {}", listing.year);
    println!("  km:          {}", listing.odometer);
    println!("  price:       R$ {}", listing.price);
    println!("  city:        {}", listing.city);
    println!("  seller:      {}", listing.owner_name);
    println!("  published:   {}", listing.created_at.format("%Y-%m-%d %H:%M"));
    println!("  contact:     {}", listing.contact_url()?);
    println!("  description: {}", listing.description);
    for image in &listing.images {
        println!("  photo:       {}", image.url);
    }
    Ok(())
}

async fn sign_in(marketplace: &Marketplace, login: &LoginArgs) -> Result<()> {
    let session = marketplace.auth().sign_in(&login.email, &login.password).await?;
    info!("signed in as {}", session.user.name);
    Ok(())
}

async fn publish(marketplace: &Marketplace, args: PublishArgs) -> Result<()> {
    sign_in(marketplace, &args.login).await?;

    let mut flow = marketplace.submission();
    for (field, value) in [
        (Field::Name, &args.name),
        (Field::Model, &args.model),
        (Field::Year, &args.year),
        (Field::Km, &args.km),
        (Field::Price, &args.price),
        (Field::City, &args.city),
        (Field::Whatsapp, &args.whatsapp),
        (Field::Description, &args.description),
    ] {
        if let Some(error) = flow.set_field(field, value) {
            println!("{}: {}", field, error.message(field));
        }
    }

    for path in &args.images {
        let blob = ImageBlob::from_file(path).await?;
        match flow.attach_image(blob).await {
            Ok(uploaded) => info!("uploaded {} to {}", path.display(), uploaded.image.url),
            Err(e) => error!("skipping {}: {}", path.display(), e),
        }
    }

    match flow.submit().await? {
        SubmitOutcome::Created(listing) => {
            println!("Published {}", listing.id);
            print_details(&listing)?;
        }
        SubmitOutcome::MissingImages => {
            return Err(Error::general("no photo could be uploaded"));
        }
    }

    marketplace.auth().sign_out().await
}

async fn mine(marketplace: &Marketplace, login: LoginArgs, delete: Option<String>) -> Result<()> {
    sign_in(marketplace, &login).await?;

    let mut dashboard = marketplace.dashboard();
    dashboard.load().await?;
    if let Some(id) = delete {
        dashboard.delete_listing(&id).await?;
        println!("Deleted {}", id);
    }

    for listing in dashboard.listings() {
        print_row(listing);
    }

    marketplace.auth().sign_out().await
}

async fn run(args: CliArgs) -> Result<()> {
    let marketplace = Marketplace::from_env()?;

    match args.command {
        Command::List => {
            let mut browse = marketplace.browse();
            for listing in browse.load().await? {
                print_row(listing);
            }
        }
        Command::Search { prefix } => {
            let mut browse = marketplace.browse();
            browse.set_input(&prefix);
            for listing in browse.search().await? {
                print_row(listing);
            }
        }
        Command::Show { id } => match marketplace.listings().get(&id).await? {
            Some(listing) => print_details(&listing)?,
            None => println!("No listing with id {}", id),
        },
        Command::Publish(publish_args) => publish(&marketplace, publish_args).await?,
        Command::Mine { login, delete } => mine(&marketplace, login, delete).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carmarket=info")),
        )
        .init();

    let args = CliArgs::parse();
    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
