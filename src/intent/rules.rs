//! Rule-based Spanish resolver.
//!
//! Classification uses the earliest command verb in the utterance, so word
//! order after the verb is free ("Asigna la tarea 3 a Ana" and
//! "Asigna a Ana la tarea 3" resolve the same way).

use super::{Folded, Intent, Resolver};
use crate::db::schema::SchemaContext;
use crate::db::users::normalize_name;
use crate::types::{SPANISH_STATUS_PHRASES, TaskFilter, TaskStatus};
use anyhow::Result;
use async_trait::async_trait;
use regex_lite::Regex;
use std::ops::Range;
use tracing::debug;

/// What the leading verb asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Delete,
    Assign,
    SetStatus,
    /// Verbs that name their target status ("completa", "bloquea").
    Shortcut(TaskStatus),
    Create,
    List,
}

const VERBS: &[(&str, Verb)] = &[
    (
        r"\b(?:elimin(?:a|ar|ala|e)|borr(?:a|ar|ala|e)|quit(?:a|ar|ala|e)|supr(?:ime|imir|imela)|descart(?:a|ar|ala))\b",
        Verb::Delete,
    ),
    (r"\b(?:re)?asign(?:a|ar|ale|ala|alo|e|ame)\b", Verb::Assign),
    (
        r"\b(?:pon|ponla|ponle|poner|marca|marcala|marcar|cambia|cambiala|cambiar|mueve|muevela|mover|actualiza|actualizala|actualizar|pasa|pasala|pasar|deja|dejala|dejar|establece)\b",
        Verb::SetStatus,
    ),
    (
        r"\b(?:complet(?:a|ar|ala|e)|termin(?:a|ar|ala|e)|finaliz(?:a|ar|ala)|cierra|cierrala|cerrar)\b",
        Verb::Shortcut(TaskStatus::Done),
    ),
    (r"\bbloque(?:a|ar|ala|e)\b", Verb::Shortcut(TaskStatus::Blocked)),
    (
        r"\b(?:desbloque(?:a|ar|ala)|reabr(?:e|ir|ela))\b",
        Verb::Shortcut(TaskStatus::Todo),
    ),
    (
        r"\b(?:empiez(?:a|o)|empezar|comienz(?:a|o)|comenzar|inici(?:a|ar|ala)|arranca|arrancar)\b",
        Verb::Shortcut(TaskStatus::InProgress),
    ),
    (
        r"\b(?:crea|crear|creame|anade|anadir|anademe|agrega|agregar|agregame|registra|registrar|apunta|apuntar|apuntame|anota|anotar|nueva\s+tarea)\b",
        Verb::Create,
    ),
    (
        r"\b(?:muestra|muestrame|mostrar|lista|listar|listame|ensena|ensename|ver|dime|dame|cuales|que\s+tareas|consulta|consultar)\b",
        Verb::List,
    ),
];

/// "tarea 3", "tarea número 3", "tarea nº 3", "tarea #3".
const TASK_REF: &str = r"\btareas?\s*(?:numero\s*|n[oº°]\.?\s*|#\s*)?(\d+)\b";

/// A delete verb's direct object: optional determiner, then the task reference.
const DELETE_OBJECT: &str =
    r"^[\s:,]+(?:(?:la|el|esta|esa|mi)\s+)?(?:tareas?\s*(?:numero\s*|n[oº°]\.?\s*|#\s*)?(\d+)|#\s*(\d+))\b";

/// Words that may sit between the create verb / "tarea" and the description.
const DESCRIPTION_CONNECTORS: &[&str] = &[
    "con la descripcion",
    "con descripcion",
    "que diga",
    "que sea",
    "llamada",
    "llamado",
    "titulada",
    "titulado",
    "sobre",
    "para",
    "que",
    "de",
];

const NAME_PREFIXES: &[&str] = &["el usuario", "la usuaria", "usuario", "usuaria"];
const TRAILING_FILLERS: &[&str] = &["por favor", "porfa"];

/// In-process resolver for Spanish task requests.
pub struct RuleResolver {
    verbs: Vec<(Regex, Verb)>,
    task_ref: Regex,
    hash_ref: Regex,
    status_phrase: Regex,
    quoted: Regex,
    task_noun: Regex,
    plural_tasks: Regex,
    assignee_after_ref: Regex,
    assignee_before_ref: Regex,
    delete_object: Regex,
    complement: Regex,
    list_assignee_marked: Regex,
    list_assignee_loose: Regex,
}

impl RuleResolver {
    pub fn new() -> Result<Self> {
        let verbs = VERBS
            .iter()
            .map(|(pattern, verb)| Ok((Regex::new(pattern)?, *verb)))
            .collect::<Result<Vec<_>>>()?;

        let phrases: Vec<String> = SPANISH_STATUS_PHRASES
            .iter()
            .map(|(phrase, _)| phrase.replace(' ', r"\s+"))
            .collect();

        Ok(Self {
            verbs,
            task_ref: Regex::new(TASK_REF)?,
            hash_ref: Regex::new(r"#\s*(\d+)\b")?,
            status_phrase: Regex::new(&format!(r"\b(?:{})\b", phrases.join("|")))?,
            quoted: Regex::new(r#""([^"]+)"|'([^']+)'|«([^»]+)»|“([^”]+)”"#)?,
            task_noun: Regex::new(r"^\s*(?:(?:una|un|la|el|mi|otra|nueva)\s+)*tareas?\b")?,
            plural_tasks: Regex::new(r"\btareas\b")?,
            assignee_after_ref: Regex::new(
                r"(?:\btareas?\s*(?:numero\s*|n[oº°]\.?\s*|#\s*)?\d+|#\s*\d+)\b\s*,?\s+(?:a|al|para)\s+(.+)$",
            )?,
            assignee_before_ref: Regex::new(
                r"\b(?:re)?asign\w*\s+(?:a|al)\s+(.+?)\s+(?:(?:la|el)\s+)?(?:tarea|#)",
            )?,
            delete_object: Regex::new(DELETE_OBJECT)?,
            complement: Regex::new(r"^\s*,?\s*(?:a|al|de|del|para)\b")?,
            list_assignee_marked: Regex::new(
                r"\btareas?\b.*?\b(?:asignad[ao]s?\s+(?:a|al)|(?:de|del|para)\s+(?:la\s+|el\s+)?usuari[oa])\s+(.+)$",
            )?,
            list_assignee_loose: Regex::new(r"\btareas?\b.*?\b(?:de|para)\s+(.+)$")?,
        })
    }

    /// Resolve an utterance with no registered users known.
    pub fn parse(&self, utterance: &str) -> Intent {
        self.parse_with_users(utterance, &[])
    }

    /// Resolve an utterance. Never fails: anything not understood is `Unrecognized`.
    ///
    /// `user_names` lets a bare "tareas de <nombre>" filter by assignee; without
    /// a match there, only "asignadas a <nombre>" or "del usuario <nombre>" do.
    pub fn parse_with_users(&self, utterance: &str, user_names: &[String]) -> Intent {
        let text = Folded::new(utterance.trim());
        let intent = self
            .classify(&text, user_names)
            .unwrap_or_else(|| Intent::unrecognized(utterance.trim()));
        debug!(utterance, intent = %intent, "Resolved utterance");
        intent
    }

    fn classify(&self, text: &Folded<'_>, user_names: &[String]) -> Option<Intent> {
        let folded = text.as_str();
        if folded.is_empty() {
            return None;
        }

        let Some((verb, verb_span)) = self.leading_verb(folded) else {
            return self.classify_without_verb(text, user_names);
        };

        match verb {
            Verb::Delete => {
                let task_id = self.delete_target(folded, verb_span.end)?;
                Some(Intent::DeleteTask { task_id })
            }
            Verb::Assign => {
                let (task_id, _) = self.task_ref(folded)?;
                let assignee_name = self.assignee_name(text)?;
                Some(Intent::AssignTask {
                    task_id,
                    assignee_name,
                })
            }
            Verb::SetStatus => {
                let (task_id, ref_span) = self.task_ref(folded)?;
                let new_status = self.status_outside(folded, &ref_span)?;
                Some(Intent::UpdateStatus {
                    task_id,
                    new_status,
                })
            }
            Verb::Shortcut(new_status) => {
                let (task_id, _) = self.task_ref(folded)?;
                Some(Intent::UpdateStatus {
                    task_id,
                    new_status,
                })
            }
            Verb::Create => {
                let description = self.description(text, verb_span.end)?;
                Some(Intent::CreateTask { description })
            }
            Verb::List => Some(Intent::ListTasks {
                filter: self.list_filter(text, user_names),
            }),
        }
    }

    /// "La tarea 3 está completada", "¿Qué hay en tareas pendientes?"
    fn classify_without_verb(&self, text: &Folded<'_>, user_names: &[String]) -> Option<Intent> {
        let folded = text.as_str();
        if let Some((task_id, ref_span)) = self.task_ref(folded) {
            let new_status = self.status_outside(folded, &ref_span)?;
            return Some(Intent::UpdateStatus {
                task_id,
                new_status,
            });
        }
        if self.plural_tasks.is_match(folded) {
            return Some(Intent::ListTasks {
                filter: self.list_filter(text, user_names),
            });
        }
        None
    }

    fn leading_verb(&self, folded: &str) -> Option<(Verb, Range<usize>)> {
        self.verbs
            .iter()
            .filter_map(|(re, verb)| re.find(folded).map(|m| (*verb, m.range())))
            .min_by_key(|(_, span)| span.start)
    }

    /// The referenced task id and the span of the reference.
    ///
    /// Ids too large for `i64` count as no reference.
    fn task_ref(&self, folded: &str) -> Option<(i64, Range<usize>)> {
        let caps = self
            .task_ref
            .captures(folded)
            .or_else(|| self.hash_ref.captures(folded))?;
        let whole = caps.get(0)?.range();
        let id = caps.get(1)?.as_str().parse::<i64>().ok()?;
        Some((id, whole))
    }

    /// The task a delete verb removes.
    ///
    /// The reference must directly follow the verb and nothing may qualify it
    /// afterwards, so "Quita a Ana de la tarea 3", "Quita la tarea 3 a Ana" and
    /// "Elimina la asignación de la tarea 3" are not deletions.
    fn delete_target(&self, folded: &str, verb_end: usize) -> Option<i64> {
        if folded.contains("asignacion") {
            return None;
        }
        let rest = &folded[verb_end..];
        let caps = self.delete_object.captures(rest)?;
        if self.complement.is_match(&rest[caps.get(0)?.end()..]) {
            return None;
        }
        caps.get(1)
            .or_else(|| caps.get(2))?
            .as_str()
            .parse::<i64>()
            .ok()
    }

    /// First status phrase that is not inside `skip`.
    fn status_outside(&self, folded: &str, skip: &Range<usize>) -> Option<TaskStatus> {
        self.status_phrase
            .find_iter(folded)
            .filter(|m| m.end() <= skip.start || m.start() >= skip.end)
            .find_map(|m| status_from_phrase(m.as_str()))
    }

    fn assignee_name(&self, text: &Folded<'_>) -> Option<String> {
        let folded = text.as_str();
        let caps = self
            .assignee_after_ref
            .captures(folded)
            .or_else(|| self.assignee_before_ref.captures(folded))?;
        let range = clean_name_range(folded, caps.get(1)?.range());
        non_empty(text.original_slice(range))
    }

    fn description(&self, text: &Folded<'_>, verb_end: usize) -> Option<String> {
        let folded = text.as_str();

        if let Some(caps) = self.quoted.captures(folded) {
            let inner = (1..=4).find_map(|i| caps.get(i))?;
            return non_empty(text.original_slice(inner.range()));
        }

        let mut start = verb_end;
        if let Some(m) = self.task_noun.find(&folded[start..]) {
            start += m.end();
        }
        start = skip_connectors(folded, start);
        let range = trim_range(folded, start..folded.len(), ".!;,");
        non_empty(text.original_slice(range))
    }

    fn list_filter(&self, text: &Folded<'_>, user_names: &[String]) -> TaskFilter {
        let folded = text.as_str();
        let mut status = None;

        // Blank status phrases so "pendientes de Ana" yields the name "Ana".
        // Phrases are ASCII, so byte offsets stay valid.
        let mut blanked = folded.to_string();
        for m in self.status_phrase.find_iter(folded) {
            if status.is_none() {
                status = status_from_phrase(m.as_str());
            }
            blanked.replace_range(m.range(), &" ".repeat(m.len()));
        }

        let capture = |re: &Regex| {
            re.captures(&blanked)
                .and_then(|caps| caps.get(1))
                .map(|m| clean_name_range(&blanked, m.range()))
                .and_then(|range| non_empty(text.original_slice(range)))
        };
        // A bare "de"/"para" complement is usually a date or topic ("de hoy"),
        // so it only names an assignee when it is a registered user.
        let assignee_name = capture(&self.list_assignee_marked).or_else(|| {
            capture(&self.list_assignee_loose).filter(|name| {
                let wanted = normalize_name(name);
                user_names.iter().any(|known| normalize_name(known) == wanted)
            })
        });

        TaskFilter {
            status,
            assignee_name,
        }
    }
}

#[async_trait]
impl Resolver for RuleResolver {
    async fn resolve(&self, utterance: &str, schema: &SchemaContext) -> Result<Intent> {
        Ok(self.parse_with_users(utterance, &schema.user_names))
    }
}

fn status_from_phrase(phrase: &str) -> Option<TaskStatus> {
    let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    SPANISH_STATUS_PHRASES
        .iter()
        .find(|(p, _)| *p == phrase)
        .map(|(_, status)| *status)
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Shrink `range` past whitespace and any of `punct` on both ends.
fn trim_range(folded: &str, range: Range<usize>, punct: &str) -> Range<usize> {
    let slice = &folded[range.clone()];
    let is_trim = |c: char| c.is_whitespace() || punct.contains(c);
    let start = range.start + (slice.len() - slice.trim_start_matches(is_trim).len());
    let end = range.start + slice.trim_end_matches(is_trim).len();
    start..end.max(start)
}

/// Does `folded[at..]` start with `word` as a whole word?
fn starts_with_word(folded: &str, at: usize, word: &str) -> bool {
    folded[at..].starts_with(word)
        && folded[at + word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric())
}

fn skip_connectors(folded: &str, mut at: usize) -> usize {
    loop {
        let before = at;
        at = trim_range(folded, at..folded.len(), ":-–,").start;
        if let Some(word) = DESCRIPTION_CONNECTORS
            .iter()
            .find(|w| starts_with_word(folded, at, w))
        {
            at += word.len();
        }
        if at == before {
            return at;
        }
    }
}

fn clean_name_range(folded: &str, range: Range<usize>) -> Range<usize> {
    let mut range = trim_range(folded, range, ".,;:!?¿¡");
    if let Some(prefix) = NAME_PREFIXES
        .iter()
        .find(|p| starts_with_word(folded, range.start, p))
    {
        range.start += prefix.len();
    }
    if let Some(filler) = TRAILING_FILLERS
        .iter()
        .find(|f| folded[range.clone()].ends_with(*f))
    {
        range.end -= filler.len();
    }
    trim_range(folded, range, ".,;:!?¿¡")
}
