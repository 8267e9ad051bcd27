mod cli;

use clap::Parser;
use cli::{Cli, Commands, SessionCommands, TagCommands, TemplateCommands};
use docflow::{
    eligible_signers, ApprovalSettings, ConfigLoader, DeputyForm, DocFlowClient, DocumentFilter,
    Error, ExpirationPeriod, GuestIdentity, LocalKeyAgent, LookupOutcome, PasswordChange,
    ProfileQuery, Result, Route, Session, SignerDto, SignerForm, SignerIdentity, SigningSession,
    VerificationOutcome, Workspace,
};
use std::collections::HashMap;
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(cli).await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::new().load(cli.config.as_deref())?;
    let mut session = Session::load(config.session_file.clone())?;
    let mut client = DocFlowClient::new(config)?;
    session.attach(&mut client);

    match cli.command {
        Commands::Session(SessionCommands::Login { token }) => {
            let user = session.establish(&mut client, token).await?;
            println!("Logged in as {} <{}>", user.full_name(), user.email);
        }
        Commands::Session(SessionCommands::Logout) => {
            session.logout(&mut client)?;
            println!("Logged out");
        }
        Commands::Session(SessionCommands::Refresh) => {
            let user = session.refresh(&client).await?;
            println!("Profile of {} reloaded", user.email);
        }
        Commands::Session(SessionCommands::Profile {
            first_name,
            last_name,
            organization,
            position,
            phone,
            iin,
            old_password,
            new_password,
            confirm_password,
        }) => {
            let mut profile = session.require_user()?.clone();
            let edits = [
                (&mut profile.first_name, first_name),
                (&mut profile.last_name, last_name),
                (&mut profile.organization, organization),
                (&mut profile.position, position),
                (&mut profile.phone, phone),
                (&mut profile.iin, iin),
            ];
            for (field, value) in edits {
                if let Some(value) = value {
                    *field = value;
                }
            }
            let password = new_password.map(|new_password| PasswordChange {
                old_password: old_password.unwrap_or_default(),
                new_password,
                confirm_password: confirm_password.unwrap_or_default(),
            });
            let changed_password = password.is_some();
            let user = session
                .update_profile(&client, &profile, password.as_ref())
                .await?;
            println!("Profile of {} updated", user.email);
            if changed_password {
                println!("Password changed");
            }
        }
        Commands::Whoami => {
            let user = session.require_user()?;
            println!("{} <{}>", user.full_name(), user.email);
            println!("id:           {}", user.id);
            if !user.organization.is_empty() {
                println!("organization: {}", user.organization);
            }
            if !user.position.is_empty() {
                println!("position:     {}", user.position);
            }
        }
        Commands::Documents { tags } => {
            let user = session.require_user()?;
            if tags.is_empty() {
                let mut workspace = Workspace::new(user);
                workspace.refresh_documents(&client, &user.id).await?;
                print_documents("Drafts", workspace.drafts());
                print_documents("Sent", workspace.sent());
            } else {
                let filter = DocumentFilter {
                    tags,
                    ..DocumentFilter::uploaded_by(&user.id)
                };
                print_documents("Tagged", &client.list_documents(&filter).await?);
            }
        }
        Commands::Upload { file, name } => {
            let user = session.require_user()?;
            let file_name = file_name(&file)?;
            let data = tokio::fs::read(&file).await?;
            let mut workspace = Workspace::new(user);
            let item = workspace
                .upload_draft(&client, &file_name, data, name.as_deref().unwrap_or(""))
                .await?;
            println!("Draft `{}` stored with id {}", item.name, item.id);
        }
        Commands::Approve {
            document_id,
            signers,
            iins,
            deputies,
            no_self,
            sequential,
            tags,
            years,
            months,
            days,
        } => {
            let user = session.require_user()?;
            let mut workspace = Workspace::new(user);
            let roster = workspace.roster_mut();
            if no_self {
                roster.toggle_self_participation()?;
            }
            let queries = signers
                .into_iter()
                .map(ProfileQuery::Email)
                .chain(iins.into_iter().map(ProfileQuery::Iin));
            for query in queries {
                let form = match client.lookup_signer(&query).await {
                    LookupOutcome::Found(form) => form,
                    LookupOutcome::NotFound => match &query {
                        ProfileQuery::Email(email) => {
                            log::warn!("{} has no account, adding by email only", email);
                            SignerForm {
                                email: email.clone(),
                                ..SignerForm::default()
                            }
                        }
                        ProfileQuery::Iin(iin) => {
                            return Err(Error::Validation(format!("No user with IIN {}", iin)))
                        }
                    },
                };
                roster.add_signer(form)?;
            }
            for deputy in deputies {
                let (signer_email, deputy_email) = deputy.split_once('=').ok_or_else(|| {
                    Error::Validation(format!("Expected SIGNER_EMAIL=DEPUTY_EMAIL, got `{}`", deputy))
                })?;
                let signer_id = roster
                    .signers()
                    .iter()
                    .find(|signer| signer.email.eq_ignore_ascii_case(signer_email))
                    .map(|signer| signer.id.clone())
                    .ok_or_else(|| Error::SignerNotFound(signer_email.to_owned()))?;
                roster.set_deputy(
                    &signer_id,
                    DeputyForm {
                        name: deputy_email.to_owned(),
                        email: deputy_email.to_owned(),
                    },
                )?;
            }
            roster.set_sequential_mode(sequential);

            let settings = ApprovalSettings {
                tags,
                expiration: ExpirationPeriod::new(years, months, days),
            };
            let initiator_id = user.id.clone();
            workspace
                .submit_draft(&client, &document_id, &initiator_id, &settings)
                .await?;
            println!(
                "Approval of {} started with {} signers",
                document_id,
                workspace.roster().len()
            );
        }
        Commands::Signers { document_id } => {
            print_signers(&client.document_signers(&document_id).await?);
        }
        Commands::Sign {
            target,
            cert,
            key,
            guest,
            deputy_of,
        } => {
            let (document_id, link_guest) = match Route::parse(&target) {
                Route::Sign { document_id, guest } => (document_id, guest),
                _ => (target, None),
            };
            let guest = guest
                .map(|guest| match deputy_of {
                    Some(signer) => GuestIdentity::DeputyOf {
                        deputy: guest,
                        signer,
                    },
                    None => GuestIdentity::Email(guest),
                })
                .or(link_guest);
            let identity = match guest {
                Some(guest) => SignerIdentity::Guest(guest),
                None => SignerIdentity::from_user(session.require_user()?),
            };

            let agent = LocalKeyAgent::from_pem_files(&cert, &key)?;
            let mut signing = SigningSession::open(&client, document_id, identity).await;
            if let Some(fingerprint) = signing.fingerprint() {
                println!("Signing {} (sha256 {})", signing.document_id(), fingerprint);
            }
            signing.sign(&client, &agent).await?;
            println!("Signed {}", signing.document_id());
            match client.document_signers(signing.document_id()).await {
                Ok(signers) => print_signers(&signers),
                Err(err) => log::warn!("Could not reload signers: {}", err),
            }
        }
        Commands::Verify { file } => {
            let file_name = file_name(&file)?;
            let data = tokio::fs::read(&file).await?;
            print_verification(client.verify_document(&file_name, &data).await?);
        }
        Commands::Tags(command) => {
            let user_id = session.require_user()?.id.clone();
            match command {
                TagCommands::List => {
                    for tag in client.list_tags(&user_id).await? {
                        println!("{}", tag);
                    }
                }
                TagCommands::Add { tag } => client.add_tag(&user_id, &tag).await?,
                TagCommands::Delete { tag } => client.delete_tag(&user_id, &tag).await?,
            }
        }
        Commands::Templates(TemplateCommands::List) => {
            for template in client.list_templates().await? {
                println!("{:<12} {}", template.id, template.name);
            }
        }
        Commands::Templates(TemplateCommands::Fields { template_id }) => {
            for field in client.template_fields(&template_id).await? {
                let required = if field.required { " (required)" } else { "" };
                println!("{:<20} {}{}", field.name, field.display_name(), required);
            }
        }
        Commands::Templates(TemplateCommands::Fill {
            template_id,
            values,
            output,
        }) => {
            let values = values
                .iter()
                .map(|pair| {
                    pair.split_once('=')
                        .map(|(name, value)| (name.to_owned(), value.to_owned()))
                        .ok_or_else(|| {
                            Error::Validation(format!("Expected FIELD=VALUE, got `{}`", pair))
                        })
                })
                .collect::<Result<HashMap<_, _>>>()?;
            let fields = client.template_fields(&template_id).await?;
            let values = docflow::normalize_template_values(&fields, &values);
            let document = client.fill_template(&template_id, &values).await?;
            tokio::fs::write(&output, document).await?;
            println!("Wrote {}", output.display());
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Validation(format!("`{}` is not a file", path.display())))
}

fn print_documents(title: &str, documents: &[docflow::DocumentItem]) {
    println!("{} ({})", title, documents.len());
    for item in documents {
        let expires = item.expiration_date.as_deref().unwrap_or("-");
        println!("  {:<10} {:<40} expires {}", item.id, item.name, expires);
    }
}

fn print_signers(signers: &[SignerDto]) {
    let eligible = eligible_signers(signers);
    for signer in signers {
        let marker = if eligible.contains(&signer) { "*" } else { " " };
        println!(
            "{} {:<30} {:<30} {}",
            marker, signer.full_name, signer.email, signer.status
        );
        if let Some(deputy) = &signer.deputy {
            println!("    deputy: {} <{}>", deputy.name, deputy.email);
        }
    }
}

fn print_verification(outcome: VerificationOutcome) {
    match outcome {
        VerificationOutcome::NoSignatures => println!("No signatures found"),
        VerificationOutcome::Legacy(entries) => {
            println!("Verified with the legacy verifier, signers were not compared");
            for entry in entries {
                println!(
                    "  {} signed {} certificate: {} reason: {}",
                    entry.name, entry.date, entry.certificate, entry.reason
                );
            }
        }
        VerificationOutcome::Reconciled {
            signatures, report, ..
        } => {
            for signature in &signatures {
                let validity = if signature.certificate_valid {
                    "valid"
                } else {
                    "INVALID"
                };
                println!(
                    "  {} ({}) certificate {}",
                    signature.author_name, signature.author_id, validity
                );
            }
            if report.is_fully_verified() {
                println!("All expected signers signed");
                return;
            }
            for signer in &report.missing {
                println!(
                    "Missing: {} <{}> {}",
                    signer.full_name, signer.email, signer.status
                );
            }
            for author_id in &report.unexpected {
                println!("Unexpected signer: {}", author_id);
            }
        }
    }
}
