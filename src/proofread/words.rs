//! Static word sets consulted by the prefilter and postfilter.
//!
//! The allow-list is intentionally small: it exists to recognize merges
//! and splits of everyday business vocabulary, not to be a dictionary.
//! Lookups are lowercase.

/// Common words accepted as "real" when judging merges and splits.
static COMMON_WORDS: phf::Set<&'static str> = phf::phf_set! {
    "a", "able", "about", "above", "accept", "access", "according", "account",
    "achieve", "across", "action", "active", "activity", "actual", "add",
    "additional", "address", "adjust", "advance", "advice", "after", "again",
    "against", "agenda", "agree", "agreement", "ahead", "all", "allow",
    "almost", "along", "already", "also", "although", "always", "amount",
    "analysis", "and", "annual", "another", "answer", "any", "anyone",
    "anything", "apply", "approach", "approval", "approve", "april", "area",
    "around", "as", "ask", "assess", "asset", "assume", "assumption", "at",
    "audit", "august", "available", "average", "avoid", "away", "back",
    "balance", "base", "based", "basis", "be", "because", "become", "been",
    "before", "begin", "behind", "being", "believe", "below", "benefit",
    "best", "better", "between", "beyond", "big", "bill", "board", "body",
    "book", "both", "brand", "break", "brief", "bring", "budget", "build",
    "business", "but", "buy", "by", "calendar", "call", "can", "capacity",
    "capital", "card", "care", "case", "cash", "cause", "center", "central",
    "certain", "chain", "chance", "change", "charge", "chart", "check",
    "choice", "choose", "claim", "clear", "client", "close", "cloud", "code",
    "come", "comment", "commit", "commitment", "common", "company", "compare",
    "complete", "compliance", "concern", "condition", "confirm", "connect",
    "consider", "contact", "content", "context", "continue", "contract",
    "control", "cost", "could", "count", "country", "course", "cover",
    "create", "credit", "critical", "current", "customer", "cycle", "daily",
    "data", "date", "day", "deal", "december", "decide", "decision", "deck",
    "deep", "define", "definition", "deliver", "delivery", "demand", "depend",
    "design", "detail", "develop", "development", "difference", "different",
    "digital", "direct", "direction", "discount", "discuss", "discussion",
    "do", "document", "does", "done", "down", "draft", "drive", "due",
    "during", "each", "early", "easy", "edge", "edit", "effect", "effective",
    "effort", "either", "email", "end", "engage", "engagement", "enough",
    "ensure", "enter", "entire", "equal", "error", "estimate", "even",
    "event", "ever", "every", "everything", "evidence", "exact", "example",
    "excel", "except", "exchange", "executive", "expect", "expense",
    "experience", "expert", "explain", "export", "extend", "external",
    "extra", "fact", "factor", "fail", "fair", "fall", "far", "fast",
    "feature", "february", "fee", "feedback", "few", "field", "figure",
    "file", "final", "finance", "financial", "find", "fine", "finish",
    "firm", "first", "fiscal", "fit", "five", "fix", "fixed", "flag",
    "focus", "follow", "for", "forecast", "form", "format", "forward",
    "four", "frame", "free", "from", "full", "function", "fund", "further",
    "future", "gain", "gap", "general", "get", "give", "global", "go",
    "goal", "good", "govern", "grant", "great", "gross", "group", "grow",
    "growth", "guide", "had", "half", "hand", "handle", "hard", "has",
    "have", "head", "hear", "held", "help", "her", "here", "high", "his",
    "hold", "home", "hour", "house", "how", "however", "idea", "identify",
    "if", "impact", "import", "important", "improve", "in", "include",
    "income", "increase", "indeed", "index", "industry", "info",
    "information", "initial", "input", "inside", "instead", "internal",
    "into", "introduce", "invest", "investment", "invoice", "involve",
    "is", "issue", "it", "item", "its", "january", "job", "join", "july",
    "june", "just", "keep", "key", "kind", "know", "known", "large", "last",
    "late", "later", "launch", "lead", "leader", "learn", "least", "leave",
    "left", "legal", "less", "let", "letter", "level", "light", "like",
    "likely", "limit", "line", "link", "list", "little", "live", "local",
    "long", "look", "loss", "low", "machine", "made", "mail", "main",
    "maintain", "major", "make", "manage", "management", "manager", "many",
    "march", "margin", "mark", "market", "marketing", "markup", "material",
    "matter", "may", "mean", "measure", "media", "meet", "meeting", "member",
    "memo", "mention", "merge", "message", "method", "metric", "might",
    "milestone", "million", "mind", "minute", "miss", "mission", "model",
    "moment", "monday", "money", "month", "monthly", "more", "moreover",
    "most", "move", "much", "must", "name", "near", "need", "net", "never",
    "new", "next", "no", "none", "nor", "not", "note", "nothing", "notice",
    "november", "now", "number", "october", "of", "off", "offer", "office",
    "official", "often", "old", "on", "once", "one", "ongoing", "online",
    "only", "open", "operate", "operation", "opinion", "option", "or",
    "order", "other", "our", "out", "outcome", "output", "outside", "over",
    "overall", "own", "owner", "ownership", "page", "paper", "part",
    "partner", "party", "pass", "past", "pay", "payment", "pending",
    "people", "per", "percent", "performance", "period", "person", "phase",
    "phone", "pick", "picture", "piece", "pilot", "place", "plan",
    "planning", "platform", "please", "point", "policy", "portfolio",
    "position", "possible", "post", "power", "practice", "present",
    "price", "pricing", "print", "prior", "priority", "private", "problem",
    "process", "produce", "product", "profit", "program", "progress",
    "project", "proposal", "propose", "provide", "public", "purchase",
    "purpose", "push", "put", "quality", "quarter", "quarterly", "question",
    "quick", "quote", "raise", "range", "rate", "rather", "reach", "read",
    "ready", "real", "reason", "recall", "receive", "recent", "record",
    "reduce", "refer", "reference", "regard", "region", "regular", "reject",
    "relate", "release", "relevant", "remain", "remember", "remove",
    "renew", "repeat", "replace", "reply", "report", "request", "require",
    "research", "reserve", "resource", "respond", "response", "rest",
    "result", "retain", "return", "revenue", "review", "revise", "right",
    "rise", "risk", "road", "role", "roll", "room", "rough", "round",
    "rule", "run", "safe", "sale", "sales", "same", "sample", "save",
    "scale", "schedule", "scope", "score", "screen", "search", "season",
    "second", "section", "secure", "security", "see", "seek", "seem",
    "segment", "select", "sell", "send", "senior", "sense", "september",
    "series", "serve", "service", "session", "set", "setting", "settle",
    "setup", "several", "shall", "share", "sheet", "shift", "ship", "short",
    "should", "show", "side", "sign", "signal", "simple", "since", "single",
    "site", "situation", "six", "size", "skill", "slide", "small", "so",
    "social", "soft", "software", "solution", "some", "something", "soon",
    "sort", "source", "space", "speak", "special", "specific", "spend",
    "split", "sponsor", "spot", "spread", "staff", "stage", "stake",
    "stand", "standard", "start", "state", "statement", "status", "stay",
    "step", "still", "stock", "stop", "store", "story", "strategy",
    "stream", "street", "strong", "structure", "study", "style", "subject",
    "submit", "success", "such", "suggest", "summary", "supply", "support",
    "sure", "system", "table", "take", "talk", "target", "task", "team",
    "tech", "technical", "template", "term", "test", "text", "than",
    "thank", "that", "the", "their", "them", "then", "there", "therefore",
    "these", "they", "thing", "think", "third", "this", "those", "though",
    "thought", "three", "through", "time", "timeline", "title", "to",
    "today", "together", "tomorrow", "too", "tool", "top", "topic", "total",
    "touch", "toward", "track", "trade", "train", "training", "transfer",
    "travel", "trend", "true", "trust", "try", "turn", "two", "type",
    "under", "understand", "unit", "until", "up", "update", "upon", "use",
    "user", "usual", "value", "various", "vendor", "version", "very",
    "view", "vision", "visit", "volume", "wait", "walk", "want", "was",
    "watch", "way", "we", "week", "weekly", "well", "were", "what", "when",
    "where", "whereas", "whether", "which", "while", "who", "whole", "why",
    "wide", "will", "win", "with", "within", "without", "word", "work",
    "workshop", "world", "would", "write", "year", "yes", "yet", "yield",
    "you", "your",
};

/// Stopwords: words so common they are never reported as misspellings on
/// their own.
static STOPWORDS: phf::Set<&'static str> = phf::phf_set! {
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from",
    "has", "he", "in", "is", "it", "its", "of", "on", "or", "that", "the",
    "to", "was", "were", "will", "with",
};

/// Connectors that commonly end up stuck between two words.
pub const CONNECTORS: &[&str] = &["as", "of", "to", "in", "on", "and", "the"];

/// Words the camel-case rule must never split.
static CAMEL_STOPLIST: phf::Set<&'static str> = phf::phf_set! {
    "therefore", "before", "after", "whereas", "moreover", "however",
    "without", "within", "another", "together", "everywhere",
};

/// Whether `word` (any case) is in the allow-list.
pub fn is_real_word(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    COMMON_WORDS.contains(lower.as_str())
}

/// Whether `word` is a stopword.
pub fn is_stopword(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    STOPWORDS.contains(lower.as_str())
}

/// Whether the camel-case rule must leave `token` alone.
pub fn camel_stoplisted(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    CAMEL_STOPLIST.contains(lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_words() {
        assert!(is_real_word("social"));
        assert!(is_real_word("Delivery"));
        assert!(!is_real_word("socal"));
        assert!(!is_real_word("xqzt"));
    }

    #[test]
    fn test_stopwords() {
        assert!(is_stopword("the"));
        assert!(!is_stopword("margin"));
    }

    #[test]
    fn test_camel_stoplist() {
        assert!(camel_stoplisted("therefore"));
        assert!(!camel_stoplisted("pricingTable"));
    }
}
