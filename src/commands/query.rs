use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::cli::{QueryArgs, default_index_path};
use crate::model::{Lesson, ScheduleIndex, ValidityRange, Weekday};
use crate::util::read_json;

#[derive(Debug, Serialize)]
struct QueryResponse<'a> {
    filter: QueryFilter<'a>,
    returned: usize,
    validity_range: Option<ValidityRange>,
    days: Vec<DaySchedule<'a>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum QueryFilter<'a> {
    Group(&'a str),
    Instructor(&'a str),
}

#[derive(Debug, Serialize)]
struct DaySchedule<'a> {
    day: Weekday,
    lessons: Vec<&'a Lesson>,
}

pub fn run(args: QueryArgs) -> Result<()> {
    let index_path = args
        .index_path
        .clone()
        .unwrap_or_else(|| default_index_path(&args.cache_root));
    let index: ScheduleIndex = read_json(&index_path)
        .with_context(|| format!("run `timetable ingest` first to create {}", index_path.display()))?;

    let filter = match (args.group.as_deref(), args.instructor.as_deref()) {
        (Some(group), _) => QueryFilter::Group(group),
        (None, Some(instructor)) => QueryFilter::Instructor(instructor),
        (None, None) => bail!("either --group or --instructor is required"),
    };

    let response = build_response(&index, filter);
    info!(
        path = %index_path.display(),
        returned = response.returned,
        "query completed"
    );

    if args.json {
        write_json_response(&response)
    } else {
        write_text_response(&response)
    }
}

fn build_response<'a>(index: &'a ScheduleIndex, filter: QueryFilter<'a>) -> QueryResponse<'a> {
    let lessons = match filter {
        QueryFilter::Group(group) => index.lessons_for_group(group),
        QueryFilter::Instructor(instructor) => index.lessons_for_instructor(instructor),
    };

    let days = ScheduleIndex::group_by_day(&lessons)
        .into_iter()
        .map(|(day, lessons)| DaySchedule { day, lessons })
        .collect();

    QueryResponse {
        filter,
        returned: lessons.len(),
        validity_range: index.validity_range,
        days,
    }
}

fn write_json_response(response: &QueryResponse<'_>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize query json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(response: &QueryResponse<'_>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_text(&mut output, response)?;
    output.flush()?;
    Ok(())
}

fn render_text<W: Write>(output: &mut W, response: &QueryResponse<'_>) -> Result<()> {
    match response.filter {
        QueryFilter::Group(group) => writeln!(output, "Группа {group}")?,
        QueryFilter::Instructor(instructor) => writeln!(output, "Преподаватель {instructor}")?,
    }
    if let Some(range) = response.validity_range {
        writeln!(
            output,
            "Действует с {} по {}",
            range.from.format("%d.%m.%Y"),
            range.to.format("%d.%m.%Y")
        )?;
    }

    if response.days.is_empty() {
        writeln!(output, "Занятий нет.")?;
        return Ok(());
    }

    for day in &response.days {
        writeln!(output)?;
        writeln!(output, "{}", day.day.display_name())?;
        for lesson in &day.lessons {
            let room = if lesson.room.is_empty() { "—" } else { &lesson.room };
            let instructors = lesson
                .instructors
                .iter()
                .map(String::as_str)
                .collect::<Vec<&str>>()
                .join(", ");

            write!(output, "\t{}", lesson.period)?;
            if let Some(time) = &lesson.time {
                write!(output, " ({time})")?;
            }
            writeln!(output, "\t{}\t{}", lesson.subject, room)?;

            let mut details = Vec::<String>::new();
            if matches!(response.filter, QueryFilter::Instructor(_)) {
                details.push(format!("группа {}", lesson.group));
            }
            if !instructors.is_empty() {
                details.push(instructors);
            }
            if !details.is_empty() {
                writeln!(output, "\t\t{}", details.join("; "))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::PeriodBucket;

    fn lesson(day: Weekday, period: PeriodBucket, group: &str, subject: &str) -> Lesson {
        Lesson {
            day,
            period,
            group: group.to_string(),
            subject: subject.to_string(),
            instructors: BTreeSet::from(["Смирнов С.С.".to_string()]),
            room: "305".to_string(),
            time: None,
        }
    }

    fn index() -> ScheduleIndex {
        ScheduleIndex {
            lessons: vec![
                lesson(Weekday::Tuesday, PeriodBucket::First, "101", "Химия"),
                lesson(Weekday::Monday, PeriodBucket::Second, "101", "Физика"),
                lesson(Weekday::Monday, PeriodBucket::First, "102", "Алгебра"),
            ],
            groups: BTreeSet::from(["101".to_string(), "102".to_string()]),
            instructors: BTreeSet::from(["Смирнов С.С.".to_string()]),
            validity_range: None,
        }
    }

    #[test]
    fn build_response_groups_group_lessons_by_day() {
        let index = index();
        let response = build_response(&index, QueryFilter::Group("101"));

        assert_eq!(response.returned, 2);
        let days = response.days.iter().map(|day| day.day).collect::<Vec<Weekday>>();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Tuesday]);
    }

    #[test]
    fn render_text_lists_days_in_order() {
        let index = index();
        let response = build_response(&index, QueryFilter::Instructor("Смирнов С.С."));

        let mut buffer = Vec::<u8>::new();
        render_text(&mut buffer, &response).expect("render should succeed");
        let text = String::from_utf8(buffer).expect("utf-8 output");

        let monday = text.find("Понедельник").expect("monday section");
        let tuesday = text.find("Вторник").expect("tuesday section");
        assert!(monday < tuesday);
        assert!(text.contains("группа 102"));
        assert!(text.find("Алгебра").expect("algebra") < text.find("Физика").expect("physics"));
    }

    #[test]
    fn render_text_reports_empty_result() {
        let index = index();
        let response = build_response(&index, QueryFilter::Group("999"));

        let mut buffer = Vec::<u8>::new();
        render_text(&mut buffer, &response).expect("render should succeed");
        assert!(String::from_utf8(buffer).expect("utf-8").contains("Занятий нет."));
    }
}
