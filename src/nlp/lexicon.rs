//! Spanish lexicon: stopwords, verb lemmas, number words and the grammar
//! phrases (actions, aggregations, comparators, ...) the ontology turns into
//! mention patterns.
//!
//! Every key in this module is lowercase and accent-folded.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

lazy_static! {
    pub static ref STOPWORDS: HashSet<&'static str> = [
        "a", "al", "ante", "bajo", "con", "contra", "de", "del", "desde", "durante", "en",
        "entre", "hacia", "hasta", "mediante", "para", "por", "segun", "sin", "sobre", "tras",
        "el", "la", "los", "las", "lo", "un", "una", "unos", "unas",
        "y", "e", "o", "u", "ni", "pero",
        "que", "cual", "cuales", "cuyo", "cuya", "cuyos", "cuyas", "donde", "como", "quien",
        "es", "son", "sea", "sean", "era", "ser", "esta", "estan", "este", "estos", "estas",
        "ese", "esa", "esos", "esas", "hay", "haya", "tenga", "tengan", "tiene", "tienen",
        "me", "te", "se", "nos", "le", "les", "mi", "mis", "su", "sus", "tu", "tus",
        "todo", "toda", "todos", "todas", "mas", "menos", "muy", "ya", "no", "si",
        "excepto", "salvo",
        "registro", "registros", "fila", "filas", "dato", "datos",
        "nuevo", "nueva", "nuevos", "nuevas",
        "llamada", "llamado", "llamadas", "llamados", "denominada", "denominado",
    ]
    .into_iter()
    .collect();

    /// Inflected verb forms (infinitives, imperatives, enclitic forms) to infinitive.
    pub static ref VERB_LEMMAS: HashMap<&'static str, &'static str> = {
        let table: &[(&str, &[&str])] = &[
            ("crear", &["crea", "cree", "crear", "creame", "crearme", "creen"]),
            ("generar", &["genera", "genere", "generar", "generame"]),
            ("construir", &["construye", "construya", "construir"]),
            ("definir", &["define", "defina", "definir"]),
            ("insertar", &["inserta", "inserte", "insertar", "insertame"]),
            ("anadir", &["anade", "anada", "anadir", "anademe"]),
            ("agregar", &["agrega", "agregue", "agregar", "agregame"]),
            ("registrar", &["registra", "registre", "registrar"]),
            ("meter", &["mete", "meta", "meter"]),
            ("actualizar", &["actualiza", "actualice", "actualizar"]),
            ("modificar", &["modifica", "modifique", "modificar"]),
            ("cambiar", &["cambia", "cambie", "cambiar"]),
            ("editar", &["edita", "edite", "editar"]),
            ("borrar", &["borra", "borre", "borrar", "borrame"]),
            ("eliminar", &["elimina", "elimine", "eliminar"]),
            ("quitar", &["quita", "quite", "quitar"]),
            ("suprimir", &["suprime", "suprima", "suprimir"]),
            ("mostrar", &["muestra", "muestre", "mostrar", "muestrame", "muestreme", "muestranos", "mostrarme"]),
            ("dar", &["dame", "deme", "danos", "dar"]),
            ("decir", &["dime", "digame", "dinos", "decir"]),
            ("listar", &["lista", "liste", "listar", "listame"]),
            ("obtener", &["obten", "obtenga", "obtener", "obtenme"]),
            ("ver", &["ver", "veamos"]),
            ("buscar", &["busca", "busque", "buscar", "buscame"]),
            ("consultar", &["consulta", "consulte", "consultar"]),
            ("seleccionar", &["selecciona", "seleccione", "seleccionar"]),
            ("traer", &["trae", "traiga", "traer", "traeme"]),
            ("contar", &["cuenta", "cuente", "contar", "cuentame"]),
            ("calcular", &["calcula", "calcule", "calcular", "calculame"]),
            ("sumar", &["sumar", "suma"]),
            ("ordenar", &["ordena", "ordene", "ordenar"]),
            ("agrupar", &["agrupa", "agrupe", "agrupar"]),
            ("tener", &["tiene", "tienen", "tenga", "tengan", "tener"]),
            ("ser", &["es", "son", "sea", "sean", "era", "ser"]),
            ("haber", &["hay", "haya"]),
            ("contener", &["contiene", "contienen", "contenga", "contengan", "contener"]),
            ("empezar", &["empieza", "empiezan", "empiece", "empiecen", "empezar"]),
            ("comenzar", &["comienza", "comienzan", "comience", "comiencen", "comenzar"]),
            ("terminar", &["termina", "terminan", "termine", "terminen", "terminar"]),
            ("acabar", &["acaba", "acaban", "acabe", "acaben", "acabar"]),
        ];
        let mut m = HashMap::new();
        for (lemma, forms) in table {
            for form in *forms {
                m.insert(*form, *lemma);
            }
        }
        // "suma" reads as a noun far more often than as an imperative
        m.remove("suma");
        m
    };

    /// Forms the plural rule gets wrong.
    pub static ref IRREGULAR_LEMMAS: HashMap<&'static str, &'static str> = [
        ("mayores", "mayor"),
        ("menores", "menor"),
        ("anos", "ano"),
        ("paises", "pais"),
        ("meses", "mes"),
    ]
    .into_iter()
    .collect();

    pub static ref NUMBER_WORDS: HashMap<&'static str, i64> = [
        ("cero", 0), ("uno", 1), ("dos", 2), ("tres", 3), ("cuatro", 4), ("cinco", 5),
        ("seis", 6), ("siete", 7), ("ocho", 8), ("nueve", 9), ("diez", 10), ("once", 11),
        ("doce", 12), ("trece", 13), ("catorce", 14), ("quince", 15), ("veinte", 20),
        ("treinta", 30), ("cuarenta", 40), ("cincuenta", 50), ("sesenta", 60),
        ("setenta", 70), ("ochenta", 80), ("noventa", 90), ("cien", 100), ("mil", 1000),
    ]
    .into_iter()
    .collect();

    /// Explicit column type words accepted in CREATE sentences.
    pub static ref TYPE_WORDS: HashMap<&'static str, &'static str> = [
        ("entero", "INTEGER"), ("enteros", "INTEGER"), ("integer", "INTEGER"), ("int", "INTEGER"),
        ("numero", "INTEGER"), ("numerico", "REAL"),
        ("texto", "TEXT"), ("cadena", "TEXT"), ("string", "TEXT"), ("varchar", "TEXT"), ("text", "TEXT"),
        ("decimal", "REAL"), ("real", "REAL"), ("flotante", "REAL"), ("float", "REAL"),
        ("booleano", "BOOLEAN"), ("bool", "BOOLEAN"),
    ]
    .into_iter()
    .collect();

    pub static ref DETERMINERS: HashSet<&'static str> = [
        "el", "la", "los", "las", "lo", "un", "una", "unos", "unas", "este", "esta", "estos",
        "estas", "ese", "esa", "esos", "esas", "todo", "toda", "todos", "todas", "cuyo",
        "cuya", "cuyos", "cuyas", "su", "sus", "mi", "mis", "tu", "tus",
    ]
    .into_iter()
    .collect();

    pub static ref ADPOSITIONS: HashSet<&'static str> = [
        "a", "al", "ante", "bajo", "con", "contra", "de", "del", "desde", "durante", "en",
        "entre", "hacia", "hasta", "mediante", "para", "por", "segun", "sin", "sobre", "tras",
    ]
    .into_iter()
    .collect();

    pub static ref CONJUNCTIONS: HashSet<&'static str> =
        ["y", "e", "o", "u", "ni", "pero"].into_iter().collect();

    pub static ref PRONOUNS: HashSet<&'static str> = [
        "que", "cual", "cuales", "quien", "donde", "me", "te", "se", "nos", "le", "les", "yo",
    ]
    .into_iter()
    .collect();

    pub static ref ADJECTIVES: HashSet<&'static str> = [
        "mayor", "menor", "maximo", "maxima", "minimo", "minima", "primero", "primera",
        "ultimo", "ultima", "nuevo", "nueva", "igual", "distinto", "diferente", "superior",
        "inferior", "descendente", "ascendente", "alto", "alta", "bajo", "baja",
    ]
    .into_iter()
    .collect();

    /// Lemmas that survive the protected reduction even when they are stopwords.
    pub static ref PROTECTED_LEMMAS: HashSet<&'static str> = [
        "no", "ni", "sin", "excepto", "salvo", "menos", "o", "u", "todo", "toda", "todos", "todas",
    ]
    .into_iter()
    .collect();

    /// Words that exclude the filter following them.
    pub static ref NEGATIONS: HashSet<&'static str> =
        ["no", "ni", "sin", "excepto", "salvo", "menos"].into_iter().collect();

    /// Verb synonyms collapsed by the synonym map.
    pub static ref VERB_SYNONYMS: HashMap<&'static str, &'static str> = [
        ("generar", "crear"), ("construir", "crear"), ("definir", "crear"),
        ("anadir", "insertar"), ("agregar", "insertar"), ("registrar", "insertar"), ("meter", "insertar"),
        ("modificar", "actualizar"), ("cambiar", "actualizar"), ("editar", "actualizar"),
        ("eliminar", "borrar"), ("quitar", "borrar"), ("suprimir", "borrar"),
        ("dar", "mostrar"), ("decir", "mostrar"), ("listar", "mostrar"), ("obtener", "mostrar"),
        ("ver", "mostrar"), ("buscar", "mostrar"), ("consultar", "mostrar"),
        ("seleccionar", "mostrar"), ("traer", "mostrar"),
    ]
    .into_iter()
    .collect();
}

/// Action verbs, keyed by the action concept they trigger.
pub const ACTION_PHRASES: &[(&str, &[&str])] = &[
    ("CREATE", &["crear", "generar", "construir", "definir"]),
    ("INSERT", &["insertar", "añadir", "agregar", "registrar", "meter"]),
    ("UPDATE", &["actualizar", "modificar", "cambiar", "editar"]),
    ("DELETE", &["borrar", "eliminar", "quitar", "suprimir"]),
    (
        "SELECT",
        &[
            "mostrar", "dar", "decir", "listar", "obtener", "ver", "buscar", "consultar",
            "seleccionar", "traer", "cuál", "cuáles",
        ],
    ),
];

pub const AGGREGATION_PHRASES: &[(&str, &[&str])] = &[
    ("COUNT", &["contar", "cuántos", "cuántas", "número de"]),
    ("SUM", &["suma", "sumar", "total", "sumatoria"]),
    ("AVG", &["promedio", "media", "promediar"]),
    ("MAX", &["máximo", "máxima", "más alto", "más alta"]),
    ("MIN", &["mínimo", "mínima", "más bajo", "más baja"]),
];

pub const COMPARATOR_PHRASES: &[(&str, &[&str])] = &[
    (">=", &["mayor o igual a", "mayor o igual que", "al menos", "como mínimo"]),
    ("<=", &["menor o igual a", "menor o igual que", "como máximo", "a lo sumo"]),
    (">", &["mayor a", "mayor que", "más de", "más que", "superior a", "por encima de"]),
    ("<", &["menor a", "menor que", "menos de", "menos que", "inferior a", "por debajo de"]),
    ("!=", &["distinto de", "distinto a", "diferente de", "diferente a"]),
    ("=", &["igual a", "igual que"]),
    ("BETWEEN", &["entre"]),
    ("CONTAINS", &["contener"]),
    ("STARTS_WITH", &["empezar por", "empezar con", "comenzar por", "comenzar con"]),
    ("ENDS_WITH", &["terminar en", "terminar con", "acabar en"]),
];

pub const LIMIT_PHRASES: &[&str] = &["primeros", "primeras", "top", "limitar a", "límite"];

pub const GROUP_PHRASES: &[&str] = &["por", "agrupado por", "agrupar por", "por cada", "para cada"];

pub const ORDER_PHRASES: &[&str] = &[
    "ordenar por",
    "ordenado por",
    "ordenada por",
    "ordenar según",
    "en orden de",
];

pub const DIRECTION_PHRASES: &[(&str, &[&str])] = &[
    ("DESC", &["descendente", "desc", "de mayor a menor"]),
    ("ASC", &["ascendente", "asc", "de menor a mayor"]),
];

pub const KEYWORD_PHRASES: &[(&str, &[&str])] = &[
    ("table", &["tabla"]),
    ("columns", &["columnas", "campos", "atributos"]),
];

/// Lowercase and strip Spanish diacritics.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

pub fn is_stopword(folded: &str) -> bool {
    STOPWORDS.contains(folded)
}

pub fn is_negation(folded: &str) -> bool {
    NEGATIONS.contains(folded)
}

pub fn is_disjunction(folded: &str) -> bool {
    folded == "o" || folded == "u"
}

pub fn number_word(folded: &str) -> Option<i64> {
    NUMBER_WORDS.get(folded).copied()
}

pub fn type_word(folded: &str) -> Option<&'static str> {
    TYPE_WORDS.get(folded).copied()
}

/// Lemma of an already folded word.
pub fn lemmatize(folded: &str) -> String {
    if let Some(lemma) = VERB_LEMMAS.get(folded) {
        return (*lemma).to_string();
    }
    if let Some(lemma) = IRREGULAR_LEMMAS.get(folded) {
        return (*lemma).to_string();
    }
    if is_stopword(folded) || folded.chars().count() <= 3 || !folded.ends_with('s') {
        return folded.to_string();
    }
    singularize(folded)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn singularize(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    // valores -> valor, ciudades -> ciudad, but nombres -> nombre
    if n > 4 && chars[n - 2] == 'e' && matches!(chars[n - 3], 'l' | 'r' | 'n' | 'd') && is_vowel(chars[n - 4]) {
        return chars[..n - 2].iter().collect();
    }
    chars[..n - 1].iter().collect()
}
