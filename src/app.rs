use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::ExplorerConfig;
use crate::data::filter::{parse_day, parse_month, FilterSelection};
use crate::data::model::{weekday_name, City};
use crate::state::Session;
use crate::ui::prompt::{ask_until, confirm, LineReader};
use crate::ui::render::{self, RULE};

const GREETING: &str = "Hello! Let's explore some US bikeshare data!";
const CITY_QUESTION: &str = "Would you like to view data for chicago, new york city or washington?";
const MONTH_QUESTION: &str = "What month would you like to view data for? \
     [all, january, february, march, april, may, june]";
const DAY_QUESTION: &str = "What day would you like to view data for? \
     [all, monday, tuesday, wednesday, thursday, friday, saturday, sunday]";

// ---------------------------------------------------------------------------
// Explorer – the session driver
// ---------------------------------------------------------------------------

/// Drives load → filter → reports, either once or as an interactive loop.
pub struct Explorer<'a, W: Write> {
    config: ExplorerConfig,
    out: &'a mut W,
}

impl<'a, W: Write> Explorer<'a, W> {
    pub fn new(config: ExplorerConfig, out: &'a mut W) -> Self {
        Self { config, out }
    }

    /// Prompt for city and filters, show the reports, and repeat while the
    /// user asks to restart.
    pub fn run_interactive(&mut self, reader: &mut dyn LineReader) -> Result<()> {
        writeln!(self.out, "{GREETING}")?;

        loop {
            let Some(session) = self.prompt_session(reader)? else {
                break;
            };

            let question = "\nWould you like to view raw trip data? Enter yes or no.";
            if confirm(reader, &mut *self.out, question)? {
                self.page_preview(reader, &session)?;
            }
            self.print_reports(&session)?;

            let question = "\nWould you like to restart? Enter yes or no.";
            if !confirm(reader, &mut *self.out, question)? {
                break;
            }
        }
        log::info!("Session finished");
        Ok(())
    }

    /// Ask for a city and filters until the city loads. `None` when the
    /// input ends.
    fn prompt_session(&mut self, reader: &mut dyn LineReader) -> Result<Option<Session>> {
        loop {
            let out = &mut *self.out;
            let Some(city) = ask_until(reader, out, CITY_QUESTION, str::parse::<City>)? else {
                return Ok(None);
            };
            let Some(month) = ask_until(reader, out, MONTH_QUESTION, parse_month)? else {
                return Ok(None);
            };
            let Some(day) = ask_until(reader, out, DAY_QUESTION, parse_day)? else {
                return Ok(None);
            };
            writeln!(self.out, "{RULE}")?;

            match Session::open(&self.config, city, FilterSelection { month, day }) {
                Ok(session) => return Ok(Some(session)),
                Err(e) => {
                    log::error!("Failed to load {city}: {e:#}");
                    writeln!(self.out, "Could not load {city} data: {e:#}\n")?;
                }
            }
        }
    }

    /// Show filtered rows a page at a time while the user wants more.
    fn page_preview(&mut self, reader: &mut dyn LineReader, session: &Session) -> Result<()> {
        let page = self.config.preview_rows.max(1);
        let rows = session.matching_rows();
        let mut pages = rows.chunks(page).peekable();
        if pages.peek().is_none() {
            writeln!(self.out, "No trips match the selected filters.")?;
        }
        while let Some(chunk) = pages.next() {
            write!(self.out, "{}", render::preview(&session.trips, chunk))?;
            if pages.peek().is_none() {
                break;
            }
            let question = format!("\nShow the next {page} rows? Enter yes or no.");
            if !confirm(reader, &mut *self.out, &question)? {
                break;
            }
        }
        writeln!(self.out, "{RULE}")?;
        Ok(())
    }

    /// Compute and print the four report sections, each timed.
    pub fn print_reports(&mut self, session: &Session) -> Result<()> {
        let table = &session.filtered;
        if session.selection.is_unfiltered() {
            writeln!(self.out, "\n{} trips in {}, no filters.", table.len(), session.city)?;
        } else {
            writeln!(
                self.out,
                "\n{} trips in {} match month: {}, day: {}.",
                table.len(),
                session.city,
                session.selection.month.map_or("all", |m| m.name()),
                session.selection.day.map_or("all", weekday_name),
            )?;
        }

        self.section("Calculating The Most Frequent Times of Travel", || {
            render::time_section(crate::stats::time::time_stats(table).as_ref())
        })?;
        self.section("Calculating The Most Popular Stations and Trip", || {
            render::station_section(crate::stats::station::station_stats(table).as_ref())
        })?;
        self.section("Calculating Trip Duration", || {
            render::duration_section(&crate::stats::duration::duration_stats(table))
        })?;
        self.section("Calculating User Stats", || {
            render::user_section(&crate::stats::user::user_stats(table), table.len())
        })?;
        Ok(())
    }

    fn section(&mut self, title: &str, body: impl FnOnce() -> String) -> Result<()> {
        writeln!(self.out, "\n{title}...\n")?;
        let started = Instant::now();
        let text = body();
        let elapsed = started.elapsed();
        write!(self.out, "{text}")?;
        writeln!(self.out, "\nThis took {:.6} seconds.", elapsed.as_secs_f64())?;
        writeln!(self.out, "{RULE}")?;
        Ok(())
    }

    /// Non-interactive pass: load, filter, optionally preview, report.
    pub fn run_once(
        &mut self,
        city: City,
        selection: FilterSelection,
        preview_rows: Option<usize>,
        as_json: bool,
    ) -> Result<()> {
        let session = Session::open(&self.config, city, selection)?;

        if as_json {
            let report = session.report();
            let doc = json!({
                "city": city.name(),
                "month": selection.month.map(|m| m.name()),
                "day": selection.day.map(weekday_name),
                "report": report,
            });
            let text = serde_json::to_string_pretty(&doc).context("serializing report")?;
            writeln!(self.out, "{text}")?;
            return Ok(());
        }

        if let Some(n) = preview_rows {
            let rows = session.matching_rows();
            let shown = &rows[..n.min(rows.len())];
            write!(self.out, "{}", render::preview(&session.trips, shown))?;
            writeln!(self.out, "{RULE}")?;
        }
        self.print_reports(&session)
    }
}
