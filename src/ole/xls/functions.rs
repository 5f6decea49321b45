//! Built-in worksheet functions and macro commands by BIFF function index.
//!
//! Indices at or above `0x8000` are command-equivalent functions, which only
//! appear in macro sheets.

/// A built-in function: name and accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub min_args: u8,
    pub max_args: u8,
}

impl FunctionInfo {
    /// Whether the function always takes the same number of arguments.
    pub fn is_fixed(&self) -> bool {
        self.min_args == self.max_args
    }
}

/// Look up a function by its `iftab` index.
pub fn lookup(index: u16) -> Option<FunctionInfo> {
    FUNCTIONS
        .binary_search_by_key(&index, |&(i, ..)| i)
        .ok()
        .map(|at| {
            let (_, name, min_args, max_args) = FUNCTIONS[at];
            FunctionInfo {
                name,
                min_args,
                max_args,
            }
        })
}

// Sorted by index.
static FUNCTIONS: &[(u16, &str, u8, u8)] = &[
    (0x0000, "COUNT", 0, 30),
    (0x0001, "IF", 1, 3),
    (0x0002, "ISNA", 1, 1),
    (0x0003, "ISERROR", 1, 1),
    (0x0004, "SUM", 0, 30),
    (0x0005, "AVERAGE", 1, 30),
    (0x0006, "MIN", 1, 30),
    (0x0007, "MAX", 1, 30),
    (0x0008, "ROW", 0, 1),
    (0x0009, "COLUMN", 0, 1),
    (0x000A, "NA", 0, 0),
    (0x000B, "NPV", 2, 30),
    (0x000C, "STDEV", 1, 30),
    (0x000D, "DOLLAR", 1, 2),
    (0x000E, "FIXED", 2, 3),
    (0x000F, "SIN", 1, 1),
    (0x0010, "COS", 1, 1),
    (0x0011, "TAN", 1, 1),
    (0x0012, "ATAN", 1, 1),
    (0x0013, "PI", 0, 0),
    (0x0014, "SQRT", 1, 1),
    (0x0015, "EXP", 1, 1),
    (0x0016, "LN", 1, 1),
    (0x0017, "LOG10", 1, 1),
    (0x0018, "ABS", 1, 1),
    (0x0019, "INT", 1, 1),
    (0x001A, "SIGN", 1, 1),
    (0x001B, "ROUND", 2, 2),
    (0x001C, "LOOKUP", 2, 3),
    (0x001D, "INDEX", 2, 4),
    (0x001E, "REPT", 2, 2),
    (0x001F, "MID", 3, 3),
    (0x0020, "LEN", 1, 1),
    (0x0021, "VALUE", 1, 1),
    (0x0022, "TRUE", 0, 0),
    (0x0023, "FALSE", 0, 0),
    (0x0024, "AND", 1, 30),
    (0x0025, "OR", 1, 30),
    (0x0026, "NOT", 1, 1),
    (0x0027, "MOD", 2, 2),
    (0x0028, "DCOUNT", 3, 3),
    (0x0029, "DSUM", 3, 3),
    (0x002A, "DAVERAGE", 3, 3),
    (0x002B, "DMIN", 3, 3),
    (0x002C, "DMAX", 3, 3),
    (0x002D, "DSTDEV", 3, 3),
    (0x002E, "VAR", 1, 30),
    (0x002F, "DVAR", 3, 3),
    (0x0030, "TEXT", 2, 2),
    (0x0031, "LINEST", 1, 4),
    (0x0032, "TREND", 1, 4),
    (0x0033, "LOGEST", 1, 4),
    (0x0034, "GROWTH", 1, 4),
    (0x0035, "GOTO", 1, 1),
    (0x0036, "HALT", 0, 1),
    (0x0037, "RETURN", 0, 1),
    (0x0038, "PV", 3, 5),
    (0x0039, "FV", 3, 5),
    (0x003A, "NPER", 3, 5),
    (0x003B, "PMT", 3, 5),
    (0x003C, "RATE", 3, 6),
    (0x003D, "MIRR", 3, 3),
    (0x003E, "IRR", 1, 2),
    (0x003F, "RAND", 0, 0),
    (0x0040, "MATCH", 2, 3),
    (0x0041, "DATE", 3, 3),
    (0x0042, "TIME", 3, 3),
    (0x0043, "DAY", 1, 1),
    (0x0044, "MONTH", 1, 1),
    (0x0045, "YEAR", 1, 1),
    (0x0046, "WEEKDAY", 1, 2),
    (0x0047, "HOUR", 1, 1),
    (0x0048, "MINUTE", 1, 1),
    (0x0049, "SECOND", 1, 1),
    (0x004A, "NOW", 0, 0),
    (0x004B, "AREAS", 1, 1),
    (0x004C, "ROWS", 1, 1),
    (0x004D, "COLUMNS", 1, 1),
    (0x004E, "OFFSET", 3, 5),
    (0x004F, "ABSREF", 2, 2),
    (0x0050, "RELREF", 2, 2),
    (0x0051, "ARGUMENT", 0, 3),
    (0x0052, "SEARCH", 2, 3),
    (0x0053, "TRANSPOSE", 1, 1),
    (0x0054, "ERROR", 0, 2),
    (0x0055, "STEP", 0, 0),
    (0x0056, "TYPE", 1, 1),
    (0x0058, "SET.NAME", 1, 2),
    (0x0059, "CALLER", 0, 0),
    (0x005A, "DEREF", 1, 1),
    (0x005B, "WINDOWS", 0, 2),
    (0x005C, "SERIESSUM", 4, 4),
    (0x005D, "DOCUMENTS", 0, 2),
    (0x005E, "ACTIVE.CELL", 0, 0),
    (0x005F, "SELECTION", 0, 0),
    (0x0060, "RESULT", 0, 1),
    (0x0061, "ATAN2", 2, 2),
    (0x0062, "ASIN", 1, 1),
    (0x0063, "ACOS", 1, 1),
    (0x0064, "CHOOSE", 2, 30),
    (0x0065, "HLOOKUP", 3, 4),
    (0x0066, "VLOOKUP", 3, 4),
    (0x0067, "LINKS", 0, 2),
    (0x0068, "INPUT", 1, 7),
    (0x0069, "ISREF", 1, 1),
    (0x006A, "GET.FORMULA", 1, 1),
    (0x006B, "GET.NAME", 1, 2),
    (0x006C, "SET.VALUE", 2, 2),
    (0x006D, "LOG", 1, 2),
    (0x006E, "EXEC", 1, 4),
    (0x006F, "CHAR", 1, 1),
    (0x0070, "LOWER", 1, 1),
    (0x0071, "UPPER", 1, 1),
    (0x0072, "PROPER", 1, 1),
    (0x0073, "LEFT", 1, 2),
    (0x0074, "RIGHT", 1, 2),
    (0x0075, "EXACT", 2, 2),
    (0x0076, "TRIM", 1, 1),
    (0x0077, "REPLACE", 4, 4),
    (0x0078, "SUBSTITUTE", 3, 4),
    (0x0079, "CODE", 1, 1),
    (0x007B, "DIRECTORY", 0, 0),
    (0x007C, "FIND", 2, 3),
    (0x007D, "CELL", 1, 2),
    (0x007E, "ISERR", 1, 1),
    (0x007F, "ISTEXT", 1, 1),
    (0x0080, "ISNUMBER", 1, 1),
    (0x0081, "ISBLANK", 1, 1),
    (0x0082, "T", 1, 1),
    (0x0083, "N", 1, 1),
    (0x0084, "FOPEN", 1, 2),
    (0x0085, "FCLOSE", 1, 1),
    (0x0086, "FSIZE", 1, 1),
    (0x0087, "FREADLN", 1, 1),
    (0x0088, "FREAD", 1, 1),
    (0x0089, "FWRITELN", 2, 2),
    (0x008A, "FWRITE", 2, 2),
    (0x008B, "FPOS", 1, 2),
    (0x008C, "DATEVALUE", 1, 1),
    (0x008D, "TIMEVALUE", 1, 1),
    (0x008E, "SLN", 3, 3),
    (0x008F, "SYD", 4, 4),
    (0x0090, "DDB", 4, 5),
    (0x0091, "GET.DEF", 1, 3),
    (0x0092, "REFTEXT", 1, 2),
    (0x0093, "TEXTREF", 1, 2),
    (0x0094, "INDIRECT", 1, 2),
    (0x0095, "REGISTER", 0, 29),
    (0x0096, "CALL", 1, 30),
    (0x0097, "ADD.BAR", 1, 30),
    (0x0098, "ADD.MENU", 1, 4),
    (0x0099, "ADD.COMMAND", 3, 5),
    (0x009A, "ENABLE.COMMAND", 4, 5),
    (0x009B, "CHECK.COMMAND", 4, 5),
    (0x009C, "RENAME.COMMAND", 4, 5),
    (0x009D, "SHOW.BAR", 1, 1),
    (0x009E, "DELETE.MENU", 2, 3),
    (0x009F, "DELETE.COMMAND", 3, 4),
    (0x00A0, "GET.CHART.ITEM", 1, 3),
    (0x00A1, "DIALOG.BOX", 1, 1),
    (0x00A2, "CLEAN", 1, 1),
    (0x00A3, "MDETERM", 1, 1),
    (0x00A4, "MINVERSE", 1, 1),
    (0x00A5, "MMULT", 2, 2),
    (0x00A6, "FILES", 0, 2),
    (0x00A7, "IPMT", 4, 6),
    (0x00A8, "PPMT", 4, 6),
    (0x00A9, "COUNTA", 0, 30),
    (0x00AA, "CANCEL.KEY", 0, 2),
    (0x00AB, "FOR", 3, 4),
    (0x00AC, "WHILE", 1, 1),
    (0x00AD, "BREAK", 0, 0),
    (0x00AE, "NEXT", 0, 0),
    (0x00AF, "INITIATE", 2, 2),
    (0x00B0, "REQUEST", 2, 2),
    (0x00B1, "POKE", 3, 3),
    (0x00B2, "EXECUTE", 2, 2),
    (0x00B3, "TERMINATE", 1, 1),
    (0x00B4, "RESTART", 1, 1),
    (0x00B5, "HELP", 1, 1),
    (0x00B6, "GET.BAR", 0, 4),
    (0x00B7, "PRODUCT", 0, 30),
    (0x00B8, "FACT", 1, 1),
    (0x00B9, "GET.CELL", 1, 2),
    (0x00BA, "GET.WORKSPACE", 1, 1),
    (0x00BB, "GET.WINDOW", 1, 2),
    (0x00BC, "GET.DOCUMENT", 1, 2),
    (0x00BD, "DPRODUCT", 3, 3),
    (0x00BE, "ISNONTEXT", 1, 1),
    (0x00BF, "GET.NOTE", 0, 3),
    (0x00C0, "NOTE", 0, 4),
    (0x00C1, "STDEVP", 1, 30),
    (0x00C2, "VARP", 1, 30),
    (0x00C3, "DSTDEVP", 3, 3),
    (0x00C4, "DVARP", 3, 3),
    (0x00C5, "TRUNC", 1, 2),
    (0x00C6, "ISLOGICAL", 1, 1),
    (0x00C7, "DCOUNTA", 3, 3),
    (0x00C8, "DELETE.BAR", 1, 1),
    (0x00C9, "UNREGISTER", 1, 1),
    (0x00CC, "USDOLLAR", 1, 2),
    (0x00CD, "FINDB", 2, 3),
    (0x00CE, "SEARCHB", 2, 3),
    (0x00CF, "REPLACEB", 4, 4),
    (0x00D0, "LEFTB", 1, 2),
    (0x00D1, "RIGHTB", 1, 2),
    (0x00D2, "MIDB", 3, 3),
    (0x00D3, "LENB", 1, 1),
    (0x00D4, "ROUNDUP", 2, 2),
    (0x00D5, "ROUNDDOWN", 2, 2),
    (0x00D6, "ASC", 1, 1),
    (0x00D7, "DBCS", 1, 1),
    (0x00D8, "RANK", 2, 3),
    (0x00DB, "ADDRESS", 2, 5),
    (0x00DC, "DAYS360", 2, 3),
    (0x00DD, "TODAY", 0, 0),
    (0x00DE, "VDB", 5, 7),
    (0x00DF, "ELSE", 0, 0),
    (0x00E0, "ELSE.IF", 1, 1),
    (0x00E1, "END.IF", 0, 0),
    (0x00E2, "FOR.CELL", 1, 3),
    (0x00E3, "MEDIAN", 1, 30),
    (0x00E4, "SUMPRODUCT", 1, 30),
    (0x00E5, "SINH", 1, 1),
    (0x00E6, "COSH", 1, 1),
    (0x00E7, "TANH", 1, 1),
    (0x00E8, "ASINH", 1, 1),
    (0x00E9, "ACOSH", 1, 1),
    (0x00EA, "ATANH", 1, 1),
    (0x00EB, "DGET", 3, 3),
    (0x00EC, "CREATE.OBJECT", 2, 11),
    (0x00ED, "VOLATILE", 1, 1),
    (0x00EE, "LAST.ERROR", 0, 0),
    (0x00EF, "CUSTOM.UNDO", 0, 2),
    (0x00F0, "CUSTOM.REPEAT", 0, 3),
    (0x00F1, "FORMULA.CONVERT", 2, 5),
    (0x00F2, "GET.LINK.INFO", 2, 4),
    (0x00F3, "TEXT.BOX", 1, 4),
    (0x00F4, "INFO", 1, 1),
    (0x00F5, "GROUP", 0, 0),
    (0x00F6, "GET.OBJECT", 1, 5),
    (0x00F7, "DB", 4, 5),
    (0x00F8, "PAUSE", 1, 1),
    (0x00FB, "RESUME", 1, 1),
    (0x00FC, "FREQUENCY", 2, 2),
    (0x00FD, "ADD.TOOLBAR", 0, 2),
    (0x00FE, "DELETE.TOOLBAR", 1, 1),
    (0x00FF, "UserDefinedFunction", 1, 30),
    (0x0100, "RESET.TOOLBAR", 1, 1),
    (0x0101, "EVALUATE", 1, 1),
    (0x0102, "GET.TOOLBAR", 2, 2),
    (0x0103, "GET.TOOL", 1, 3),
    (0x0104, "SPELLING.CHECK", 1, 3),
    (0x0105, "ERROR.TYPE", 1, 1),
    (0x0106, "APP.TITLE", 1, 1),
    (0x0107, "WINDOW.TITLE", 1, 1),
    (0x0108, "SAVE.TOOLBAR", 0, 2),
    (0x0109, "ENABLE.TOOL", 3, 3),
    (0x010A, "PRESS.TOOL", 3, 3),
    (0x010B, "REGISTER.ID", 3, 3),
    (0x010C, "GET.WORKBOOK", 1, 2),
    (0x010D, "AVEDEV", 1, 30),
    (0x010E, "BETADIST", 3, 5),
    (0x010F, "GAMMALN", 1, 1),
    (0x0110, "BETAINV", 3, 5),
    (0x0111, "BINOMDIST", 4, 4),
    (0x0112, "CHIDIST", 2, 2),
    (0x0113, "CHIINV", 2, 2),
    (0x0114, "COMBIN", 2, 2),
    (0x0115, "CONFIDENCE", 3, 3),
    (0x0116, "CRITBINOM", 3, 3),
    (0x0117, "EVEN", 1, 1),
    (0x0118, "EXPONDIST", 3, 3),
    (0x0119, "FDIST", 3, 3),
    (0x011A, "FINV", 3, 3),
    (0x011B, "FISHER", 1, 1),
    (0x011C, "FISHERINV", 1, 1),
    (0x011D, "FLOOR", 2, 2),
    (0x011E, "GAMMADIST", 4, 4),
    (0x011F, "GAMMAINV", 3, 3),
    (0x0120, "CEILING", 2, 2),
    (0x0121, "HYPGEOMDIST", 4, 4),
    (0x0122, "LOGNORMDIST", 3, 3),
    (0x0123, "LOGINV", 3, 3),
    (0x0124, "NEGBINOMDIST", 3, 3),
    (0x0125, "NORMDIST", 4, 4),
    (0x0126, "NORMSDIST", 1, 1),
    (0x0127, "NORMINV", 3, 3),
    (0x0128, "NORMSINV", 1, 1),
    (0x0129, "STANDARDIZE", 3, 3),
    (0x012A, "ODD", 1, 1),
    (0x012B, "PERMUT", 2, 2),
    (0x012C, "POISSON", 3, 3),
    (0x012D, "TDIST", 3, 3),
    (0x012E, "WEIBULL", 4, 4),
    (0x012F, "SUMXMY2", 2, 2),
    (0x0130, "SUMX2MY2", 2, 2),
    (0x0131, "SUMX2PY2", 2, 2),
    (0x0132, "CHITEST", 2, 2),
    (0x0133, "CORREL", 2, 2),
    (0x0134, "COVAR", 2, 2),
    (0x0135, "FORECAST", 3, 3),
    (0x0136, "FTEST", 2, 2),
    (0x0137, "INTERCEPT", 2, 2),
    (0x0138, "PEARSON", 2, 2),
    (0x0139, "RSQ", 2, 2),
    (0x013A, "STEYX", 2, 2),
    (0x013B, "SLOPE", 2, 2),
    (0x013C, "TTEST", 4, 4),
    (0x013D, "PROB", 3, 4),
    (0x013E, "DEVSQ", 1, 30),
    (0x013F, "GEOMEAN", 1, 30),
    (0x0140, "HARMEAN", 1, 30),
    (0x0141, "SUMSQ", 0, 30),
    (0x0142, "KURT", 1, 30),
    (0x0143, "SKEW", 1, 30),
    (0x0144, "ZTEST", 2, 3),
    (0x0145, "LARGE", 2, 2),
    (0x0146, "SMALL", 2, 2),
    (0x0147, "QUARTILE", 2, 2),
    (0x0148, "PERCENTILE", 2, 2),
    (0x0149, "PERCENTRANK", 2, 3),
    (0x014A, "MODE", 1, 30),
    (0x014B, "TRIMMEAN", 2, 2),
    (0x014C, "TINV", 2, 2),
    (0x0150, "CONCATENATE", 0, 30),
    (0x0151, "POWER", 2, 2),
    (0x0156, "RADIANS", 1, 1),
    (0x0157, "DEGREES", 1, 1),
    (0x0158, "SUBTOTAL", 2, 30),
    (0x0159, "SUMIF", 2, 3),
    (0x015A, "COUNTIF", 2, 2),
    (0x015B, "COUNTBLANK", 1, 1),
    (0x015E, "ISPMT", 4, 4),
    (0x015F, "DATEDIF", 3, 3),
    (0x0160, "DATESTRING", 1, 1),
    (0x0161, "NUMBERSTRING", 2, 2),
    (0x0162, "ROMAN", 1, 2),
    (0x0166, "GETPIVOTDATA", 2, 2),
    (0x0167, "HYPERLINK", 1, 2),
    (0x0168, "PHONETIC", 1, 1),
    (0x0169, "AVERAGEA", 1, 30),
    (0x016A, "MAXA", 1, 30),
    (0x016B, "MINA", 1, 30),
    (0x016C, "STDEVPA", 1, 30),
    (0x016D, "VARPA", 1, 30),
    (0x016E, "STDEVA", 1, 30),
    (0x016F, "VARA", 1, 30),
    (0x0170, "BAHTTEXT", 1, 1),
    (0x0171, "THAIDAYOFWEEK", 1, 1),
    (0x0172, "THAIDIGIT", 1, 1),
    (0x0173, "THAIMONTHOFYEAR", 1, 1),
    (0x0174, "THAINUMSOUND", 1, 1),
    (0x0175, "THAINUMSTRING", 1, 1),
    (0x0176, "THAISTRINGLENGTH", 1, 1),
    (0x0177, "ISTHAIDIGIT", 1, 1),
    (0x0178, "ROUNDBAHTDOWN", 1, 1),
    (0x0179, "ROUNDBAHTUP", 1, 1),
    (0x017A, "THAIYEAR", 1, 1),
    (0x017B, "RTD", 2, 5),
    (0x8000, "BEEP", 0, 1),
    (0x8001, "OPEN", 0, 17),
    (0x8002, "OPEN.LINKS", 0, 15),
    (0x8003, "CLOSE.ALL", 0, 0),
    (0x8004, "SAVE", 0, 0),
    (0x8005, "SAVE.AS", 0, 7),
    (0x8006, "FILE.DELETE", 0, 1),
    (0x8007, "PAGE.SETUP", 0, 30),
    (0x8008, "PRINT", 0, 17),
    (0x8009, "PRINTER.SETUP", 0, 1),
    (0x800A, "QUIT", 0, 0),
    (0x800B, "NEW.WINDOW", 0, 0),
    (0x800C, "ARRANGE.ALL", 0, 4),
    (0x800D, "WINDOW.SIZE", 0, 3),
    (0x800E, "WINDOW.MOVE", 0, 3),
    (0x800F, "FULL", 0, 1),
    (0x8010, "CLOSE", 0, 2),
    (0x8011, "RUN", 0, 2),
    (0x8016, "SET.PRINT.AREA", 0, 1),
    (0x8017, "SET.PRINT.TITLES", 0, 2),
    (0x8018, "SET.PAGE.BREAK", 0, 0),
    (0x8019, "REMOVE.PAGE.BREAK", 0, 2),
    (0x801A, "FONT", 0, 2),
    (0x801B, "DISPLAY", 0, 9),
    (0x801C, "PROTECT.DOCUMENT", 0, 7),
    (0x801D, "PRECISION", 0, 1),
    (0x801E, "A1.R1C1", 0, 1),
    (0x801F, "CALCULATE.NOW", 0, 0),
    (0x8020, "CALCULATION", 0, 11),
    (0x8022, "DATA.FIND", 0, 1),
    (0x8023, "EXTRACT", 0, 1),
    (0x8024, "DATA.DELETE", 0, 0),
    (0x8025, "SET.DATABASE", 0, 0),
    (0x8026, "SET.CRITERIA", 0, 0),
    (0x8027, "SORT", 0, 17),
    (0x8028, "DATA.SERIES", 0, 6),
    (0x8029, "TABLE", 0, 2),
    (0x802A, "FORMAT.NUMBER", 0, 1),
    (0x802B, "ALIGNMENT", 0, 10),
    (0x802C, "STYLE", 0, 2),
    (0x802D, "BORDER", 0, 27),
    (0x802E, "CELL.PROTECTION", 0, 2),
    (0x802F, "COLUMN.WIDTH", 0, 5),
    (0x8030, "UNDO", 0, 0),
    (0x8031, "CUT", 0, 2),
    (0x8032, "COPY", 0, 2),
    (0x8033, "PASTE", 0, 1),
    (0x8034, "CLEAR", 0, 1),
    (0x8035, "PASTE.SPECIAL", 0, 7),
    (0x8036, "EDIT.DELETE", 0, 1),
    (0x8037, "INSERT", 0, 2),
    (0x8038, "FILL.RIGHT", 0, 0),
    (0x8039, "FILL.DOWN", 0, 0),
    (0x803D, "DEFINE.NAME", 0, 7),
    (0x803E, "CREATE.NAMES", 0, 4),
    (0x803F, "FORMULA.GOTO", 0, 2),
    (0x8040, "FORMULA.FIND", 0, 12),
    (0x8041, "SELECT.LAST.CELL", 0, 0),
    (0x8042, "SHOW.ACTIVE.CELL", 0, 0),
    (0x8043, "GALLERY.AREA", 0, 2),
    (0x8044, "GALLERY.BAR", 0, 2),
    (0x8045, "GALLERY.COLUMN", 0, 2),
    (0x8046, "GALLERY.LINE", 0, 2),
    (0x8047, "GALLERY.PIE", 0, 2),
    (0x8048, "GALLERY.SCATTER", 0, 2),
    (0x8049, "COMBINATION", 0, 1),
    (0x804A, "PREFERRED", 0, 0),
    (0x804B, "ADD.OVERLAY", 0, 0),
    (0x804C, "GRIDLINES", 0, 7),
    (0x804D, "SET.PREFERRED", 0, 1),
    (0x804E, "AXES", 0, 6),
    (0x804F, "LEGEND", 0, 1),
    (0x8050, "ATTACH.TEXT", 0, 3),
    (0x8051, "ADD.ARROW", 0, 0),
    (0x8052, "SELECT.CHART", 0, 0),
    (0x8053, "SELECT.PLOT.AREA", 0, 0),
    (0x8054, "PATTERNS", 0, 13),
    (0x8055, "MAIN.CHART", 0, 10),
    (0x8056, "OVERLAY", 0, 12),
    (0x8057, "SCALE", 0, 10),
    (0x8058, "FORMAT.LEGEND", 0, 1),
    (0x8059, "FORMAT.TEXT", 0, 11),
    (0x805A, "EDIT.REPEAT", 0, 0),
    (0x805B, "PARSE", 0, 2),
    (0x805C, "JUSTIFY", 0, 0),
    (0x805D, "HIDE", 0, 0),
    (0x805E, "UNHIDE", 0, 1),
    (0x805F, "WORKSPACE", 0, 16),
    (0x8060, "FORMULA", 0, 2),
    (0x8061, "FORMULA.FILL", 0, 2),
    (0x8062, "FORMULA.ARRAY", 0, 2),
    (0x8063, "DATA.FIND.NEXT", 0, 0),
    (0x8064, "DATA.FIND.PREV", 0, 0),
    (0x8065, "FORMULA.FIND.NEXT", 0, 0),
    (0x8066, "FORMULA.FIND.PREV", 0, 0),
    (0x8067, "ACTIVATE", 0, 2),
    (0x8068, "ACTIVATE.NEXT", 0, 1),
    (0x8069, "ACTIVATE.PREV", 0, 1),
    (0x806A, "UNLOCKED.NEXT", 0, 0),
    (0x806B, "UNLOCKED.PREV", 0, 0),
    (0x806C, "COPY.PICTURE", 0, 3),
    (0x806D, "SELECT", 0, 2),
    (0x806E, "DELETE.NAME", 0, 1),
    (0x806F, "DELETE.FORMAT", 0, 1),
    (0x8070, "VLINE", 0, 1),
    (0x8071, "HLINE", 0, 1),
    (0x8072, "VPAGE", 0, 1),
    (0x8073, "HPAGE", 0, 1),
    (0x8074, "VSCROLL", 0, 2),
    (0x8075, "HSCROLL", 0, 2),
    (0x8076, "ALERT", 0, 3),
    (0x8077, "NEW", 0, 3),
    (0x8078, "CANCEL.COPY", 0, 1),
    (0x8079, "SHOW.CLIPBOARD", 0, 0),
    (0x807A, "MESSAGE", 0, 2),
    (0x807C, "PASTE.LINK", 0, 0),
    (0x807D, "APP.ACTIVATE", 0, 2),
    (0x807E, "DELETE.ARROW", 0, 0),
    (0x807F, "ROW.HEIGHT", 0, 4),
    (0x8080, "FORMAT.MOVE", 0, 3),
    (0x8081, "FORMAT.SIZE", 0, 3),
    (0x8082, "FORMULA.REPLACE", 0, 11),
    (0x8083, "SEND.KEYS", 0, 2),
    (0x8084, "SELECT.SPECIAL", 0, 3),
    (0x8085, "APPLY.NAMES", 0, 7),
    (0x8086, "REPLACE.FONT", 0, 10),
    (0x8087, "FREEZE.PANES", 0, 3),
    (0x8088, "SHOW.INFO", 0, 1),
    (0x8089, "SPLIT", 0, 2),
    (0x808A, "ON.WINDOW", 0, 2),
    (0x808B, "ON.DATA", 0, 2),
    (0x808C, "DISABLE.INPUT", 0, 1),
    (0x808E, "OUTLINE", 0, 4),
    (0x808F, "LIST.NAMES", 0, 0),
    (0x8090, "FILE.CLOSE", 0, 2),
    (0x8091, "SAVE.WORKBOOK", 0, 6),
    (0x8092, "DATA.FORM", 0, 0),
    (0x8093, "COPY.CHART", 0, 1),
    (0x8094, "ON.TIME", 0, 4),
    (0x8095, "WAIT", 0, 1),
    (0x8096, "FORMAT.FONT", 0, 15),
    (0x8097, "FILL.UP", 0, 0),
    (0x8098, "FILL.LEFT", 0, 0),
    (0x8099, "DELETE.OVERLAY", 0, 0),
    (0x809B, "SHORT.MENUS", 0, 1),
    (0x809F, "SET.UPDATE.STATUS", 0, 3),
    (0x80A1, "COLOR.PALETTE", 0, 1),
    (0x80A2, "DELETE.STYLE", 0, 1),
    (0x80A3, "WINDOW.RESTORE", 0, 1),
    (0x80A4, "WINDOW.MAXIMIZE", 0, 1),
    (0x80A6, "CHANGE.LINK", 0, 3),
    (0x80A7, "CALCULATE.DOCUMENT", 0, 0),
    (0x80A8, "ON.KEY", 0, 2),
    (0x80A9, "APP.RESTORE", 0, 0),
    (0x80AA, "APP.MOVE", 0, 2),
    (0x80AB, "APP.SIZE", 0, 2),
    (0x80AC, "APP.MINIMIZE", 0, 0),
    (0x80AD, "APP.MAXIMIZE", 0, 0),
    (0x80AE, "BRING.TO.FRONT", 0, 0),
    (0x80AF, "SEND.TO.BACK", 0, 0),
    (0x80B9, "MAIN.CHART.TYPE", 0, 1),
    (0x80BA, "OVERLAY.CHART.TYPE", 0, 1),
    (0x80BB, "SELECT.END", 0, 1),
    (0x80BC, "OPEN.MAIL", 0, 2),
    (0x80BD, "SEND.MAIL", 0, 3),
    (0x80BE, "STANDARD.FONT", 0, 9),
    (0x80BF, "CONSOLIDATE", 0, 5),
    (0x80C0, "SORT.SPECIAL", 0, 14),
    (0x80C1, "GALLERY.3D.AREA", 0, 1),
    (0x80C2, "GALLERY.3D.COLUMN", 0, 1),
    (0x80C3, "GALLERY.3D.LINE", 0, 1),
    (0x80C4, "GALLERY.3D.PIE", 0, 1),
    (0x80C5, "VIEW.3D", 0, 6),
    (0x80C6, "GOAL.SEEK", 0, 3),
    (0x80C7, "WORKGROUP", 0, 1),
    (0x80C8, "FILL.GROUP", 0, 1),
    (0x80C9, "UPDATE.LINK", 0, 2),
    (0x80CA, "PROMOTE", 0, 1),
    (0x80CB, "DEMOTE", 0, 1),
    (0x80CC, "SHOW.DETAIL", 0, 4),
    (0x80CE, "UNGROUP", 0, 0),
    (0x80CF, "OBJECT.PROPERTIES", 0, 2),
    (0x80D0, "SAVE.NEW.OBJECT", 0, 1),
    (0x80D1, "SHARE", 0, 0),
    (0x80D2, "SHARE.NAME", 0, 1),
    (0x80D3, "DUPLICATE", 0, 0),
    (0x80D4, "APPLY.STYLE", 0, 1),
    (0x80D5, "ASSIGN.TO.OBJECT", 0, 1),
    (0x80D6, "OBJECT.PROTECTION", 0, 2),
    (0x80D7, "HIDE.OBJECT", 0, 2),
    (0x80D8, "SET.EXTRACT", 0, 0),
    (0x80D9, "CREATE.PUBLISHER", 0, 4),
    (0x80DA, "SUBSCRIBE.TO", 0, 2),
    (0x80DB, "ATTRIBUTES", 0, 2),
    (0x80DC, "SHOW.TOOLBAR", 0, 10),
    (0x80DE, "PRINT.PREVIEW", 0, 1),
    (0x80DF, "EDIT.COLOR", 0, 4),
    (0x80E0, "SHOW.LEVELS", 0, 2),
    (0x80E1, "FORMAT.MAIN", 0, 14),
    (0x80E2, "FORMAT.OVERLAY", 0, 14),
    (0x80E3, "ON.RECALC", 0, 2),
    (0x80E4, "EDIT.SERIES", 0, 7),
    (0x80E5, "DEFINE.STYLE", 0, 14),
    (0x80F0, "LINE.PRINT", 0, 11),
    (0x80F3, "ENTER.DATA", 0, 1),
    (0x80F9, "GALLERY.RADAR", 0, 2),
    (0x80FA, "MERGE.STYLES", 0, 1),
    (0x80FB, "EDITION.OPTIONS", 0, 7),
    (0x80FC, "PASTE.PICTURE", 0, 0),
    (0x80FD, "PASTE.PICTURE.LINK", 0, 0),
    (0x80FE, "SPELLING", 0, 6),
    (0x8100, "ZOOM", 0, 1),
    (0x8103, "INSERT.OBJECT", 0, 13),
    (0x8104, "WINDOW.MINIMIZE", 0, 1),
    (0x8109, "SOUND.NOTE", 0, 3),
    (0x810A, "SOUND.PLAY", 0, 3),
    (0x810B, "FORMAT.SHAPE", 0, 5),
    (0x810C, "EXTEND.POLYGON", 0, 1),
    (0x810D, "FORMAT.AUTO", 0, 7),
    (0x8110, "GALLERY.3D.BAR", 0, 1),
    (0x8111, "GALLERY.3D.SURFACE", 0, 1),
    (0x8112, "FILL.AUTO", 0, 2),
    (0x8114, "CUSTOMIZE.TOOLBAR", 0, 1),
    (0x8115, "ADD.TOOL", 0, 3),
    (0x8116, "EDIT.OBJECT", 0, 1),
    (0x8117, "ON.DOUBLECLICK", 0, 2),
    (0x8118, "ON.ENTRY", 0, 2),
    (0x8119, "WORKBOOK.ADD", 0, 3),
    (0x811A, "WORKBOOK.MOVE", 0, 3),
    (0x811B, "WORKBOOK.COPY", 0, 3),
    (0x811C, "WORKBOOK.OPTIONS", 0, 3),
    (0x811D, "SAVE.WORKSPACE", 0, 1),
    (0x8120, "CHART.WIZARD", 0, 14),
    (0x8121, "DELETE.TOOL", 0, 2),
    (0x8122, "MOVE.TOOL", 0, 6),
    (0x8123, "WORKBOOK.SELECT", 0, 3),
    (0x8124, "WORKBOOK.ACTIVATE", 0, 2),
    (0x8125, "ASSIGN.TO.TOOL", 0, 3),
    (0x8127, "COPY.TOOL", 0, 2),
    (0x8128, "RESET.TOOL", 0, 2),
    (0x8129, "CONSTRAIN.NUMERIC", 0, 1),
    (0x812A, "PASTE.TOOL", 0, 2),
    (0x812E, "WORKBOOK.NEW", 0, 3),
    (0x8131, "SCENARIO.CELLS", 0, 1),
    (0x8132, "SCENARIO.DELETE", 0, 1),
    (0x8133, "SCENARIO.ADD", 0, 6),
    (0x8134, "SCENARIO.EDIT", 0, 7),
    (0x8135, "SCENARIO.SHOW", 0, 1),
    (0x8136, "SCENARIO.SHOW.NEXT", 0, 0),
    (0x8137, "SCENARIO.SUMMARY", 0, 2),
    (0x8138, "PIVOT.TABLE.WIZARD", 0, 16),
    (0x8139, "PIVOT.FIELD.PROPERTIES", 0, 7),
    (0x813A, "PIVOT.FIELD", 0, 4),
    (0x813B, "PIVOT.ITEM", 0, 4),
    (0x813C, "PIVOT.ADD.FIELDS", 0, 5),
    (0x813E, "OPTIONS.CALCULATION", 0, 10),
    (0x813F, "OPTIONS.EDIT", 0, 11),
    (0x8140, "OPTIONS.VIEW", 0, 18),
    (0x8141, "ADDIN.MANAGER", 0, 3),
    (0x8142, "MENU.EDITOR", 0, 0),
    (0x8143, "ATTACH.TOOLBARS", 0, 0),
    (0x8144, "VBAActivate", 0, 2),
    (0x8145, "OPTIONS.CHART", 0, 3),
    (0x8148, "VBA.INSERT.FILE", 0, 1),
    (0x814A, "VBA.PROCEDURE.DEFINITION", 0, 0),
    (0x8150, "ROUTING.SLIP", 0, 6),
    (0x8152, "ROUTE.DOCUMENT", 0, 0),
    (0x8153, "MAIL.LOGON", 0, 3),
    (0x8156, "INSERT.PICTURE", 0, 2),
    (0x8157, "EDIT.TOOL", 0, 2),
    (0x8158, "GALLERY.DOUGHNUT", 0, 2),
    (0x815E, "CHART.TREND", 0, 8),
    (0x8160, "PIVOT.ITEM.PROPERTIES", 0, 7),
    (0x8162, "WORKBOOK.INSERT", 0, 1),
    (0x8163, "OPTIONS.TRANSITION", 0, 5),
    (0x8164, "OPTIONS.GENERAL", 0, 14),
    (0x8172, "FILTER.ADVANCED", 0, 5),
    (0x8175, "MAIL.ADD.MAILER", 0, 0),
    (0x8176, "MAIL.DELETE.MAILER", 0, 0),
    (0x8177, "MAIL.REPLY", 0, 0),
    (0x8178, "MAIL.REPLY.ALL", 0, 0),
    (0x8179, "MAIL.FORWARD", 0, 0),
    (0x817A, "MAIL.NEXT.LETTER", 0, 0),
    (0x817B, "DATA.LABEL", 0, 10),
    (0x817C, "INSERT.TITLE", 0, 5),
    (0x817D, "FONT.PROPERTIES", 0, 14),
    (0x817E, "MACRO.OPTIONS", 0, 10),
    (0x817F, "WORKBOOK.HIDE", 0, 2),
    (0x8180, "WORKBOOK.UNHIDE", 0, 1),
    (0x8181, "WORKBOOK.DELETE", 0, 1),
    (0x8182, "WORKBOOK.NAME", 0, 2),
    (0x8184, "GALLERY.CUSTOM", 0, 1),
    (0x8186, "ADD.CHART.AUTOFORMAT", 0, 2),
    (0x8187, "DELETE.CHART.AUTOFORMAT", 0, 1),
    (0x8188, "CHART.ADD.DATA", 0, 6),
    (0x8189, "AUTO.OUTLINE", 0, 0),
    (0x818A, "TAB.ORDER", 0, 0),
    (0x818B, "SHOW.DIALOG", 0, 1),
    (0x818C, "SELECT.ALL", 0, 0),
    (0x818D, "UNGROUP.SHEETS", 0, 0),
    (0x818E, "SUBTOTAL.CREATE", 0, 6),
    (0x818F, "SUBTOTAL.REMOVE", 0, 0),
    (0x8190, "RENAME.OBJECT", 0, 1),
    (0x819C, "WORKBOOK.SCROLL", 0, 2),
    (0x819D, "WORKBOOK.NEXT", 0, 0),
    (0x819E, "WORKBOOK.PREV", 0, 0),
    (0x819F, "WORKBOOK.TAB.SPLIT", 0, 1),
    (0x81A0, "FULL.SCREEN", 0, 1),
    (0x81A1, "WORKBOOK.PROTECT", 0, 3),
    (0x81A4, "SCROLLBAR.PROPERTIES", 0, 7),
    (0x81A5, "PIVOT.SHOW.PAGES", 0, 2),
    (0x81A6, "TEXT.TO.COLUMNS", 0, 14),
    (0x81A7, "FORMAT.CHARTTYPE", 0, 4),
    (0x81A8, "LINK.FORMAT", 0, 0),
    (0x81A9, "TRACER.DISPLAY", 0, 2),
    (0x81AE, "TRACER.NAVIGATE", 0, 3),
    (0x81AF, "TRACER.CLEAR", 0, 0),
    (0x81B0, "TRACER.ERROR", 0, 0),
    (0x81B1, "PIVOT.FIELD.GROUP", 0, 4),
    (0x81B2, "PIVOT.FIELD.UNGROUP", 0, 0),
    (0x81B3, "CHECKBOX.PROPERTIES", 0, 5),
    (0x81B4, "LABEL.PROPERTIES", 0, 3),
    (0x81B5, "LISTBOX.PROPERTIES", 0, 5),
    (0x81B6, "EDITBOX.PROPERTIES", 0, 4),
    (0x81B7, "PIVOT.REFRESH", 0, 1),
    (0x81B8, "LINK.COMBO", 0, 1),
    (0x81B9, "OPEN.TEXT", 0, 17),
    (0x81BA, "HIDE.DIALOG", 0, 1),
    (0x81BB, "SET.DIALOG.FOCUS", 0, 1),
    (0x81BC, "ENABLE.OBJECT", 0, 2),
    (0x81BD, "PUSHBUTTON.PROPERTIES", 0, 6),
    (0x81BE, "SET.DIALOG.DEFAULT", 0, 1),
    (0x81BF, "FILTER", 0, 6),
    (0x81C0, "FILTER.SHOW.ALL", 0, 0),
    (0x81C1, "CLEAR.OUTLINE", 0, 0),
    (0x81C2, "FUNCTION.WIZARD", 0, 1),
    (0x81C3, "ADD.LIST.ITEM", 0, 2),
    (0x81C4, "SET.LIST.ITEM", 0, 2),
    (0x81C5, "REMOVE.LIST.ITEM", 0, 2),
    (0x81C6, "SELECT.LIST.ITEM", 0, 2),
    (0x81C7, "SET.CONTROL.VALUE", 0, 1),
    (0x81C8, "SAVE.COPY.AS", 0, 1),
    (0x81CA, "OPTIONS.LISTS.ADD", 0, 2),
    (0x81CB, "OPTIONS.LISTS.DELETE", 0, 1),
    (0x81CC, "SERIES.AXES", 0, 1),
    (0x81CD, "SERIES.X", 0, 1),
    (0x81CE, "SERIES.Y", 0, 2),
    (0x81CF, "ERRORBAR.X", 0, 4),
    (0x81D0, "ERRORBAR.Y", 0, 4),
    (0x81D1, "FORMAT.CHART", 0, 18),
    (0x81D2, "SERIES.ORDER", 0, 3),
    (0x81D3, "MAIL.LOGOFF", 0, 0),
    (0x81D4, "CLEAR.ROUTING.SLIP", 0, 1),
    (0x81D5, "APP.ACTIVATE.MICROSOFT", 0, 1),
    (0x81D6, "MAIL.EDIT.MAILER", 0, 6),
    (0x81D7, "ON.SHEET", 0, 3),
    (0x81D8, "STANDARD.WIDTH", 0, 1),
    (0x81D9, "SCENARIO.MERGE", 0, 1),
    (0x81DA, "SUMMARY.INFO", 0, 5),
    (0x81DB, "FIND.FILE", 0, 0),
    (0x81DC, "ACTIVE.CELL.FONT", 0, 14),
    (0x81DD, "ENABLE.TIPWIZARD", 0, 1),
    (0x81DE, "VBA.MAKE.ADDIN", 0, 1),
    (0x81E0, "INSERTDATATABLE", 0, 1),
    (0x81E1, "WORKGROUP.OPTIONS", 0, 0),
    (0x81E2, "MAIL.SEND.MAILER", 0, 2),
    (0x81E5, "AUTOCORRECT", 0, 2),
    (0x81E9, "POST.DOCUMENT", 0, 1),
    (0x81EB, "PICKLIST", 0, 0),
    (0x81ED, "VIEW.SHOW", 0, 1),
    (0x81EE, "VIEW.DEFINE", 0, 3),
    (0x81EF, "VIEW.DELETE", 0, 1),
    (0x81FD, "SHEET.BACKGROUND", 0, 2),
    (0x81FE, "INSERT.MAP.OBJECT", 0, 0),
    (0x81FF, "OPTIONS.MENONO", 0, 5),
    (0x8205, "MSOCHECKS", 0, 0),
    (0x8206, "NORMAL", 0, 0),
    (0x8207, "LAYOUT", 0, 0),
    (0x8208, "RM.PRINT.AREA", 0, 1),
    (0x8209, "CLEAR.PRINT.AREA", 0, 0),
    (0x820A, "ADD.PRINT.AREA", 0, 0),
    (0x820B, "MOVE.BRK", 0, 4),
    (0x8221, "HIDECURR.NOTE", 0, 2),
    (0x8222, "HIDEALL.NOTES", 0, 1),
    (0x8223, "DELETE.NOTE", 0, 1),
    (0x8224, "TRAVERSE.NOTES", 0, 2),
    (0x8225, "ACTIVATE.NOTES", 0, 2),
    (0x826C, "PROTECT.REVISIONS", 0, 0),
    (0x826D, "UNPROTECT.REVISIONS", 0, 0),
    (0x8287, "OPTIONS.ME", 0, 9),
    (0x828D, "WEB.PUBLISH", 0, 9),
    (0x829B, "NEWWEBQUERY", 0, 1),
    (0x82A1, "PIVOT.TABLE.CHART", 0, 16),
    (0x82F1, "OPTIONS.SAVE", 0, 4),
    (0x82F3, "OPTIONS.SPELL", 0, 12),
    (0x8328, "HIDEALL.INKANNOTS", 0, 1),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(FUNCTIONS.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(FUNCTIONS.iter().all(|&(_, _, min, max)| min <= max));
    }

    #[test]
    fn test_lookup() {
        let sum = lookup(4).unwrap();
        assert_eq!(sum.name, "SUM");
        assert!(!sum.is_fixed());

        let round = lookup(27).unwrap();
        assert_eq!((round.name, round.min_args, round.max_args), ("ROUND", 2, 2));
        assert!(round.is_fixed());

        assert_eq!(lookup(0x8011).unwrap().name, "RUN");
        assert!(lookup(0x7000).is_none());
    }
}
