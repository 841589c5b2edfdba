//! Static question bank used when the AI service is unavailable.

use crate::types::QuizQuestion;
use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::HashMap;

/// Pool served for unknown skills.
pub const GENERAL_POOL: &str = "general";

fn q(question: &str, options: [&str; 4], correct: usize, explanation: &str) -> QuizQuestion {
    QuizQuestion::new(
        question,
        options.iter().map(|o| o.to_string()).collect(),
        correct,
        explanation,
    )
}

static BUILTIN: Lazy<HashMap<&'static str, Vec<QuizQuestion>>> = Lazy::new(|| {
    let mut bank = HashMap::new();
    bank.insert(
        "javascript",
        vec![
            q(
                "What does `typeof null` return in JavaScript?",
                ["\"null\"", "\"object\"", "\"undefined\"", "\"number\""],
                1,
                "A long-standing quirk: `typeof null` evaluates to \"object\".",
            ),
            q(
                "Which keyword declares a block-scoped variable that cannot be reassigned?",
                ["var", "let", "const", "static"],
                2,
                "`const` creates a block-scoped binding that cannot be reassigned.",
            ),
            q(
                "What is the result of `[1, 2, 3].map(x => x * 2)`?",
                ["[1, 2, 3]", "[2, 4, 6]", "6", "[1, 4, 9]"],
                1,
                "`map` returns a new array with the callback applied to every element.",
            ),
            q(
                "Which method turns a JSON string into a JavaScript value?",
                ["JSON.stringify", "JSON.parse", "JSON.decode", "Object.fromJSON"],
                1,
                "`JSON.parse` parses a JSON string into the value it describes.",
            ),
            q(
                "What does `===` compare?",
                ["Value only", "Type only", "Value and type", "References only"],
                2,
                "Strict equality compares both value and type without coercion.",
            ),
        ],
    );
    bank.insert(
        "python",
        vec![
            q(
                "Which type is immutable in Python?",
                ["list", "dict", "set", "tuple"],
                3,
                "Tuples cannot be modified after creation.",
            ),
            q(
                "What does `len({'a': 1, 'b': 2})` return?",
                ["1", "2", "3", "An error"],
                1,
                "`len` of a dict counts its keys.",
            ),
            q(
                "Which keyword defines a generator function's yielded values?",
                ["return", "yield", "emit", "async"],
                1,
                "`yield` produces values lazily from a generator.",
            ),
            q(
                "What is the output of `print(3 // 2)`?",
                ["1.5", "1", "2", "0"],
                1,
                "`//` is floor division, so 3 // 2 is 1.",
            ),
            q(
                "Which statement handles exceptions?",
                ["try/except", "catch/throw", "do/rescue", "guard/else"],
                0,
                "Python handles exceptions with `try`/`except` blocks.",
            ),
        ],
    );
    bank.insert(
        "rust",
        vec![
            q(
                "What happens to a `String` after it is moved into another variable?",
                [
                    "It is copied",
                    "The original binding can no longer be used",
                    "It becomes a reference",
                    "It is cloned lazily",
                ],
                1,
                "Moving transfers ownership; the old binding is invalidated.",
            ),
            q(
                "Which type represents an optional value?",
                ["Result<T, E>", "Option<T>", "Box<T>", "Maybe<T>"],
                1,
                "`Option<T>` is either `Some(T)` or `None`.",
            ),
            q(
                "How many mutable references to a value may exist at once?",
                ["Unlimited", "Two", "One", "None"],
                2,
                "The borrow checker allows exactly one active mutable reference.",
            ),
            q(
                "Which operator propagates an error from a function returning `Result`?",
                ["!", "?", "&", "=>"],
                1,
                "`?` returns early with the error if the result is `Err`.",
            ),
            q(
                "Which trait enables `{}` formatting?",
                ["Debug", "Display", "ToString", "Format"],
                1,
                "`Display` powers `{}`; `Debug` powers `{:?}`.",
            ),
        ],
    );
    bank.insert(
        "html-css",
        vec![
            q(
                "Which HTML element holds the main heading of a page?",
                ["<head>", "<header>", "<h1>", "<title>"],
                2,
                "`<h1>` is the top-level heading element.",
            ),
            q(
                "Which CSS property changes text color?",
                ["font-color", "text-color", "color", "foreground"],
                2,
                "The `color` property sets the text color.",
            ),
            q(
                "Which display value lays children out along a single axis?",
                ["block", "flex", "inline", "none"],
                1,
                "`display: flex` creates a flex container with a main axis.",
            ),
            q(
                "Which selector targets an element with id `main`?",
                [".main", "#main", "main", "*main"],
                1,
                "`#` selects by id, `.` selects by class.",
            ),
        ],
    );
    bank.insert(
        "react",
        vec![
            q(
                "Which hook stores local component state?",
                ["useEffect", "useState", "useMemo", "useRef"],
                1,
                "`useState` returns a state value and its setter.",
            ),
            q(
                "What must every element in a rendered list carry?",
                ["An id prop", "A key prop", "A ref", "A className"],
                1,
                "Keys let React match list items across renders.",
            ),
            q(
                "When does a `useEffect` with an empty dependency array run?",
                ["On every render", "Only after the first render", "Never", "Before render"],
                1,
                "An empty array means the effect runs once after mounting.",
            ),
            q(
                "How is data passed from a parent to a child component?",
                ["Through props", "Through state", "Through context only", "Through refs"],
                0,
                "Props are the inputs a parent passes to a child.",
            ),
        ],
    );
    bank.insert(
        GENERAL_POOL,
        vec![
            q(
                "What does CPU stand for?",
                [
                    "Central Processing Unit",
                    "Computer Personal Unit",
                    "Central Program Utility",
                    "Core Processing Utility",
                ],
                0,
                "The CPU executes program instructions.",
            ),
            q(
                "Which data structure follows last-in, first-out order?",
                ["Queue", "Stack", "Heap", "Tree"],
                1,
                "A stack pops the most recently pushed element first.",
            ),
            q(
                "What is the binary representation of decimal 5?",
                ["100", "101", "110", "111"],
                1,
                "5 = 4 + 1, so its binary form is 101.",
            ),
            q(
                "Which protocol secures web traffic?",
                ["HTTP", "FTP", "HTTPS", "SMTP"],
                2,
                "HTTPS is HTTP over TLS.",
            ),
            q(
                "What is the time complexity of binary search?",
                ["O(n)", "O(log n)", "O(n log n)", "O(1)"],
                1,
                "Each step halves the search space.",
            ),
            q(
                "Which of these is a version control system?",
                ["Git", "Docker", "Nginx", "Redis"],
                0,
                "Git tracks changes to files over time.",
            ),
            q(
                "What does RAM lose when power is switched off?",
                ["Nothing", "Its contents", "Its address space", "Its clock speed"],
                1,
                "RAM is volatile memory.",
            ),
            q(
                "Which number system has base 16?",
                ["Binary", "Octal", "Decimal", "Hexadecimal"],
                3,
                "Hexadecimal digits run from 0 to F.",
            ),
            q(
                "What does an API define?",
                [
                    "A screen layout",
                    "How software components communicate",
                    "A database schema only",
                    "A network cable standard",
                ],
                1,
                "An API is a contract between software components.",
            ),
            q(
                "Which structure maps keys to values?",
                ["Array", "Linked list", "Hash map", "Stack"],
                2,
                "A hash map stores key/value pairs with fast lookup.",
            ),
            q(
                "What is recursion?",
                [
                    "A loop with a counter",
                    "A function calling itself",
                    "A memory leak",
                    "A sorting algorithm",
                ],
                1,
                "A recursive function solves a problem by calling itself on smaller inputs.",
            ),
            q(
                "Which unit is 1024 bytes?",
                ["Bit", "Kibibyte", "Megabyte", "Nibble"],
                1,
                "A kibibyte (KiB) is exactly 1024 bytes.",
            ),
        ],
    );
    bank
});

/// Question bank keyed by skill id, falling back to [`GENERAL_POOL`].
#[derive(Debug, Clone)]
pub struct FallbackPool {
    banks: HashMap<String, Vec<QuizQuestion>>,
}

impl FallbackPool {
    /// The hand-authored bank shipped with the crate.
    pub fn builtin() -> Self {
        let banks = BUILTIN
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Self { banks }
    }

    /// An empty bank; add skills with [`with_skill`](Self::with_skill).
    pub fn empty() -> Self {
        Self {
            banks: HashMap::new(),
        }
    }

    /// Replace the questions for `skill_id`. Invalid questions are skipped.
    pub fn with_skill(mut self, skill_id: impl Into<String>, questions: Vec<QuizQuestion>) -> Self {
        let valid = questions.into_iter().filter(|q| q.validate().is_ok()).collect();
        self.banks.insert(skill_id.into(), valid);
        self
    }

    /// Questions for `skill_id`, or the general pool when the skill is unknown.
    pub fn questions_for(&self, skill_id: &str) -> &[QuizQuestion] {
        self.banks
            .get(skill_id)
            .filter(|b| !b.is_empty())
            .or_else(|| self.banks.get(GENERAL_POOL))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn pool_size(&self, skill_id: &str) -> usize {
        self.questions_for(skill_id).len()
    }

    /// Uniform random pick from the skill's pool.
    pub fn random_question(&self, skill_id: &str) -> Option<QuizQuestion> {
        let pool = self.questions_for(skill_id);
        if pool.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..pool.len());
        Some(pool[idx].clone())
    }

    /// Look a question up by its exact text in any pool.
    pub fn find(&self, question: &str) -> Option<&QuizQuestion> {
        self.banks
            .values()
            .flat_map(|b| b.iter())
            .find(|q| q.question == question)
    }
}

impl Default for FallbackPool {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_questions_are_valid() {
        let pool = FallbackPool::builtin();
        for skill in ["javascript", "python", "rust", "html-css", "react", GENERAL_POOL] {
            assert!(
                pool.banks.get(skill).is_some_and(|b| !b.is_empty()),
                "missing {skill}"
            );
            for q in pool.questions_for(skill) {
                q.validate().unwrap();
            }
        }
        assert!(pool.pool_size(GENERAL_POOL) >= 10);
    }

    #[test]
    fn test_unknown_skill_uses_general_pool() {
        let pool = FallbackPool::builtin();
        assert_eq!(pool.pool_size("underwater-basket-weaving"), pool.pool_size(GENERAL_POOL));
        let q = pool.random_question("underwater-basket-weaving").unwrap();
        assert!(pool.questions_for(GENERAL_POOL).contains(&q));
    }

    #[test]
    fn test_random_question_comes_from_skill_pool() {
        let pool = FallbackPool::builtin();
        for _ in 0..20 {
            let q = pool.random_question("rust").unwrap();
            assert!(pool.questions_for("rust").contains(&q));
        }
    }

    #[test]
    fn test_custom_skill_skips_invalid() {
        let pool = FallbackPool::empty().with_skill(
            "custom",
            vec![
                QuizQuestion::new("ok?", vec!["a".into(), "b".into()], 0, ""),
                QuizQuestion::new("bad?", vec!["a".into()], 0, ""),
            ],
        );
        assert_eq!(pool.pool_size("custom"), 1);
        assert_eq!(pool.pool_size("other"), 0);
        assert!(pool.random_question("other").is_none());
        assert!(pool.find("ok?").is_some());
    }
}
