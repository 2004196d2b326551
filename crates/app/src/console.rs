//! The interactive command loop over any line reader and writer.

use std::io;
use std::path::PathBuf;

use pocketnotes_core::validation::{Credentials, Registration};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::command::{Command, HELP};
use crate::controller::{App, EditForm, NoteForm};
use crate::screens;

const BANNER: &str = "PocketNotes. Type `help` for commands.";

pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read and run commands until `quit` or end of input.
    pub async fn run(&mut self, app: &mut App) -> io::Result<()> {
        self.say(BANNER).await?;

        loop {
            let Some(line) = self.prompt("> ").await? else {
                break;
            };
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    self.say(&e.to_string()).await?;
                    continue;
                }
            };

            if command.requires_session() && !app.is_signed_in() {
                self.say(screens::LOGIN_REQUIRED).await?;
                continue;
            }

            let reply = match command {
                Command::Quit => break,
                Command::Help => HELP.to_string(),
                Command::SignUp {
                    email,
                    password,
                    confirm_password,
                } => {
                    app.sign_up(Registration::new(email, password, confirm_password))
                        .await
                }
                Command::LogIn { email, password } => {
                    app.log_in(Credentials::new(email, password)).await
                }
                Command::LogOut => app.log_out().await,
                Command::List => app.list().await,
                Command::Refresh => app.refresh().await,
                Command::Show(target) => app.show(&target).await,
                Command::New => match self.note_form().await? {
                    Some(form) => app.create(form).await,
                    None => break,
                },
                Command::Edit(target) => match app.find(&target).await {
                    None => screens::NOTE_NOT_FOUND.to_string(),
                    Some(note) => match self.edit_form(&note.title, &note.body).await? {
                        Some(form) => app.edit(&note, form).await,
                        None => break,
                    },
                },
                Command::Delete(target) => app.delete(&target).await,
            };
            self.say(&reply).await?;
        }

        self.out.flush().await
    }

    /// `None` when input ends mid-form.
    async fn note_form(&mut self) -> io::Result<Option<NoteForm>> {
        let Some(title) = self.prompt("Title: ").await? else {
            return Ok(None);
        };
        let Some(body) = self.prompt("Content: ").await? else {
            return Ok(None);
        };
        let Some(image) = self.prompt("Image path (optional): ").await? else {
            return Ok(None);
        };
        let image = image.trim();
        Ok(Some(NoteForm {
            title,
            body,
            image_path: (!image.is_empty()).then(|| PathBuf::from(image)),
        }))
    }

    /// Blank answers keep the current value.
    async fn edit_form(&mut self, title: &str, body: &str) -> io::Result<Option<EditForm>> {
        let Some(new_title) = self.prompt(&format!("Title [{title}]: ")).await? else {
            return Ok(None);
        };
        let Some(new_body) = self.prompt(&format!("Content [{body}]: ")).await? else {
            return Ok(None);
        };
        let keep_blank = |v: String| (!v.trim().is_empty()).then_some(v);
        Ok(Some(EditForm {
            title: keep_blank(new_title),
            body: keep_blank(new_body),
        }))
    }

    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.out.write_all(label.as_bytes()).await?;
        self.out.flush().await?;
        self.lines.next_line().await
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await
    }
}
