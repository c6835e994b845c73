pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use signbeat::{
    rating::RatingLabel,
    util::{format_time, split_lyrics, LYRIC_LINE_WIDTH},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const TRACK: &str = "─";
const CUE: &str = "●";
const ZONE: &str = "┃";

/// Column of the cue on a lane `width` cells wide whose last cell is the
/// perfect zone.
pub fn cue_column(position: f64, perfect_zone: f64, width: u16) -> u16 {
    if width == 0 || perfect_zone <= 0.0 {
        return 0;
    }
    let last = (width - 1) as f64;
    let col = (position / perfect_zone * last).round();
    col.clamp(0.0, last) as u16
}

fn rating_style(rating: RatingLabel) -> Style {
    let color = match rating {
        RatingLabel::Perfect => Color::Magenta,
        RatingLabel::Good => Color::Green,
        RatingLabel::Ok => Color::Yellow,
        RatingLabel::Miss => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let state = engine.state();

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let lyrics = split_lyrics(&state.current_lyric_fragment, LYRIC_LINE_WIDTH);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title, time, score
            Constraint::Length(1),
            Constraint::Length(1), // lane
            Constraint::Length(1), // rating flash
            Constraint::Length(1),
            Constraint::Length(1), // prompt
            Constraint::Min(1),    // lyrics
            Constraint::Length(1), // legend
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(engine.song_title().to_string(), bold_style),
        Span::raw("   "),
        Span::styled(format_time(state.remaining_duration_ms), dim_bold_style),
        Span::raw("   "),
        Span::styled(format!("score {}", state.score), bold_style),
    ]))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    let lane = chunks[2];
    if lane.width > 0 {
        let cue = cue_column(
            engine.position(),
            engine.device().perfect_zone_distance(),
            lane.width,
        );
        let zone = lane.width - 1;
        for x in 0..lane.width {
            let (symbol, style) = if engine.entries_complete() && x != zone {
                (TRACK, dim_bold_style)
            } else if x == cue && engine.current_entry_index().is_some() {
                (CUE, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            } else if x == zone {
                (ZONE, Style::default().fg(Color::Magenta))
            } else {
                (TRACK, dim_bold_style)
            };
            if let Some(cell) = buf.cell_mut((lane.x + x, lane.y)) {
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }

    if let Some(rating) = app.flash.visible(app.now) {
        Paragraph::new(Span::styled(rating.to_string(), rating_style(rating)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    let prompt = if engine.entries_complete() {
        Span::styled("...", dim_bold_style)
    } else {
        Span::styled(state.current_prompt.clone(), bold_style)
    };
    Paragraph::new(prompt)
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    let lyric_lines: Vec<Line> = lyrics
        .into_iter()
        .map(|l| Line::from(Span::styled(l, italic_style)))
        .collect();
    Paragraph::new(lyric_lines)
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

    let legend = Paragraph::new(Span::styled(
        if app.autoplayer.is_some() {
            "autoplay / (esc)ape"
        } else {
            "(a-z) fingerspell / (1) I love you / (2) You / (3) Me / (esc)ape"
        },
        italic_style,
    ));
    legend.render(chunks[7], buf);
}

pub fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // title
            Constraint::Length(1), // score
            Constraint::Length(1), // best
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let Some(summary) = &app.summary else {
        return;
    };

    Paragraph::new(Span::styled(summary.song_title.clone(), bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!("{} points", summary.final_score),
        Style::default().patch(bold_style).fg(Color::Green),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(best) = summary.best {
        Paragraph::new(Span::styled(
            format!("best {best}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled("(r)etry / (esc)ape", italic_style)).render(chunks[5], buf);
}
