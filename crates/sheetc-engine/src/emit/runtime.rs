//! Embedded runtime helper prelude
//!
//! The Python function library included at the top of every emitted
//! script: numeric coercion, the cell-store range builder, the `xl_*`
//! counterparts of every catalog entry, and the dynamic shims that take
//! the live cell store and current sheet.

/// Python source included verbatim ahead of the compute function
pub const RUNTIME_HELPERS: &str = r#"import datetime
import math


def _to_num(val):
    if val is None:
        return 0
    if isinstance(val, bool):
        return 1 if val else 0
    if isinstance(val, (int, float)):
        return val
    try:
        return float(val)
    except (ValueError, TypeError):
        return 0


def _flatten(args):
    out = []
    for a in args:
        if isinstance(a, (list, tuple)):
            out.extend(_flatten(a))
        else:
            out.append(a)
    return out


def _ci(col):
    r = 0
    for ch in str(col).upper():
        r = r * 26 + (ord(ch) - 64)
    return r


def _cl(idx):
    r = ""
    idx = int(idx)
    while idx > 0:
        idx, rem = divmod(idx - 1, 26)
        r = chr(65 + rem) + r
    return r


def _rng(c, sheet, c1, r1, c2, r2):
    ci1 = _ci(c1) if isinstance(c1, str) else int(c1)
    ci2 = _ci(c2) if isinstance(c2, str) else int(c2)
    rows = []
    for r in range(int(r1), int(r2) + 1):
        rows.append([c.get((sheet, _cl(ci), r)) for ci in range(ci1, ci2 + 1)])
    return rows


def _match_criteria(value, criteria):
    if isinstance(criteria, str):
        if criteria.startswith(">="):
            return _to_num(value) >= _to_num(criteria[2:])
        if criteria.startswith("<="):
            return _to_num(value) <= _to_num(criteria[2:])
        if criteria.startswith("<>"):
            return value != criteria[2:] and str(value) != criteria[2:]
        if criteria.startswith(">"):
            return _to_num(value) > _to_num(criteria[1:])
        if criteria.startswith("<"):
            return _to_num(value) < _to_num(criteria[1:])
        if criteria.startswith("="):
            crit = criteria[1:]
            return value == crit or str(value) == crit
        if "*" in criteria or "?" in criteria:
            import fnmatch
            return fnmatch.fnmatch(str(value).lower(), criteria.lower())
        return value == criteria or str(value) == criteria
    return value == criteria


# ---- math ----

def xl_sum(*args):
    return sum(_to_num(v) for v in _flatten(args) if v is not None)


def xl_average(*args):
    vals = [_to_num(v) for v in _flatten(args) if v is not None]
    return sum(vals) / len(vals) if vals else 0


def xl_count(*args):
    return sum(1 for v in _flatten(args)
               if isinstance(v, (int, float)) and not isinstance(v, bool))


def xl_counta(*args):
    return sum(1 for v in _flatten(args) if v is not None and v != "")


def xl_min(*args):
    vals = [_to_num(v) for v in _flatten(args) if v is not None]
    return min(vals) if vals else 0


def xl_max(*args):
    vals = [_to_num(v) for v in _flatten(args) if v is not None]
    return max(vals) if vals else 0


def xl_roundup(val, digits=0):
    factor = 10 ** int(digits)
    return math.ceil(_to_num(val) * factor) / factor


def xl_rounddown(val, digits=0):
    factor = 10 ** int(digits)
    return math.floor(_to_num(val) * factor) / factor


def xl_mod(n, d):
    return _to_num(n) % _to_num(d)


def xl_power(base, exp):
    return _to_num(base) ** _to_num(exp)


def xl_sqrt(val):
    return math.sqrt(_to_num(val))


def xl_ln(val):
    return math.log(_to_num(val))


def xl_log(val, base=10):
    return math.log(_to_num(val), _to_num(base))


def xl_log10(val):
    return math.log10(_to_num(val))


def xl_exp(val):
    return math.exp(_to_num(val))


def xl_ceiling(val, significance=1):
    s = _to_num(significance) or 1
    return math.ceil(_to_num(val) / s) * s


def xl_floor(val, significance=1):
    s = _to_num(significance) or 1
    return math.floor(_to_num(val) / s) * s


def xl_median(*args):
    vals = sorted(_to_num(v) for v in _flatten(args) if v is not None)
    if not vals:
        return 0
    mid = len(vals) // 2
    if len(vals) % 2:
        return vals[mid]
    return (vals[mid - 1] + vals[mid]) / 2


def xl_stdev(*args):
    vals = [_to_num(v) for v in _flatten(args) if v is not None]
    if len(vals) < 2:
        return 0
    mean = sum(vals) / len(vals)
    return math.sqrt(sum((v - mean) ** 2 for v in vals) / (len(vals) - 1))


def xl_var(*args):
    vals = [_to_num(v) for v in _flatten(args) if v is not None]
    if len(vals) < 2:
        return 0
    mean = sum(vals) / len(vals)
    return sum((v - mean) ** 2 for v in vals) / (len(vals) - 1)


def xl_sumproduct(*arrays):
    flat = [_flatten([a]) for a in arrays]
    if not flat:
        return 0
    n = min(len(a) for a in flat)
    total = 0
    for i in range(n):
        product = 1
        for arr in flat:
            product *= _to_num(arr[i])
        total += product
    return total


def xl_pi():
    return math.pi


# ---- logical ----

def xl_if(condition, true_val, false_val=False):
    return true_val if condition else false_val


def xl_and(*args):
    return all(bool(a) for a in _flatten(args))


def xl_or(*args):
    return any(bool(a) for a in _flatten(args))


def xl_not(val):
    return not bool(val)


def xl_iferror(val, error_val):
    return error_val if val is None else val


def xl_ifna(val, na_val):
    return na_val if val is None else val


def xl_iserror(val):
    return val is None


def xl_isna(val):
    return val is None


def xl_isblank(val):
    return val is None or val == ""


def xl_isnumber(val):
    return isinstance(val, (int, float)) and not isinstance(val, bool)


def xl_na():
    return None


# ---- lookup ----

def xl_vlookup(lookup_val, table, col_index, range_lookup=True):
    col = int(_to_num(col_index)) - 1
    if range_lookup:
        best = None
        for row in table:
            if row and row[0] is not None and _to_num(row[0]) <= _to_num(lookup_val):
                best = row
            elif row and row[0] is not None:
                break
        if best and col < len(best):
            return best[col]
        return None
    for row in table:
        if row and row[0] == lookup_val:
            return row[col] if col < len(row) else None
    return None


def xl_hlookup(lookup_val, table, row_index, range_lookup=True):
    if not table:
        return None
    row = int(_to_num(row_index)) - 1
    if row < 0 or row >= len(table):
        return None
    best = None
    for ci, val in enumerate(table[0]):
        if not range_lookup:
            if val == lookup_val:
                best = ci
                break
        elif val is not None and _to_num(val) <= _to_num(lookup_val):
            best = ci
    if best is None or best >= len(table[row]):
        return None
    return table[row][best]


def xl_index(array, row_num, col_num=None):
    r = int(_to_num(row_num)) - 1
    if not isinstance(array, list) or r < 0 or r >= len(array):
        return None
    row = array[r]
    if col_num is None:
        if isinstance(row, (list, tuple)):
            return row[0] if row else None
        return row
    ci = int(_to_num(col_num)) - 1
    if isinstance(row, (list, tuple)):
        return row[ci] if 0 <= ci < len(row) else None
    return row if ci == 0 else None


def xl_match(lookup_val, lookup_array, match_type=1):
    flat = _flatten([lookup_array])
    if match_type == 0:
        for i, v in enumerate(flat):
            if v == lookup_val:
                return i + 1
        return None
    best = None
    for i, v in enumerate(flat):
        if v is None:
            continue
        if match_type == 1 and _to_num(v) <= _to_num(lookup_val):
            best = i + 1
        elif match_type == -1 and _to_num(v) >= _to_num(lookup_val):
            best = i + 1
    return best


def xl_choose(index, *choices):
    i = int(_to_num(index)) - 1
    return choices[i] if 0 <= i < len(choices) else None


def xl_lookup(lookup_val, lookup_vector, result_vector=None):
    lv = _flatten([lookup_vector])
    rv = _flatten([result_vector]) if result_vector is not None else lv
    best = None
    for i, v in enumerate(lv):
        if v is not None and _to_num(v) <= _to_num(lookup_val):
            best = i
    if best is None or best >= len(rv):
        return None
    return rv[best]


def xl_transpose(array):
    if not isinstance(array, list) or not array:
        return array
    if not isinstance(array[0], (list, tuple)):
        return [[v] for v in array]
    return [list(row) for row in zip(*array)]


def xl_rows(array):
    return len(array) if isinstance(array, list) else 1


def xl_columns(array):
    if isinstance(array, list) and array and isinstance(array[0], (list, tuple)):
        return len(array[0])
    return 1


# ---- dynamic shims: receive the live cell store and current sheet ----

def xl_indirect(c, sheet, ref_text, a1=True):
    if ref_text is None:
        return None
    text = str(ref_text).strip().strip("'").strip('"')
    if "!" in text:
        sheet, text = text.split("!", 1)
        sheet = sheet.strip("'")
    i = 0
    while i < len(text) and text[i] in "$":
        i += 1
    j = i
    while j < len(text) and text[j].isalpha():
        j += 1
    col = text[i:j]
    row = text[j:].replace("$", "")
    if not col or not row.isdigit():
        return None
    return c.get((sheet, col.upper(), int(row)))


def xl_offset(c, sheet, col, row, rows=0, cols=0, height=None, width=None):
    if col is None or row is None:
        return None
    ci = _ci(col) + int(_to_num(cols))
    r = int(_to_num(row)) + int(_to_num(rows))
    if ci < 1 or r < 1:
        return None
    h = 1 if height is None else int(_to_num(height))
    w = 1 if width is None else int(_to_num(width))
    if h == 1 and w == 1:
        return c.get((sheet, _cl(ci), r))
    return _rng(c, sheet, _cl(ci), r, _cl(ci + w - 1), r + h - 1)


def xl_row(c, sheet, ref=None):
    return ref


def xl_column(c, sheet, ref=None):
    return ref


# ---- text ----

def xl_left(text, num_chars=1):
    return str(text)[:int(_to_num(num_chars))] if text is not None else ""


def xl_right(text, num_chars=1):
    return str(text)[-int(_to_num(num_chars)):] if text is not None else ""


def xl_mid(text, start_num, num_chars):
    s = str(text) if text is not None else ""
    start = int(_to_num(start_num)) - 1
    return s[start:start + int(_to_num(num_chars))]


def xl_len(text):
    return len(str(text)) if text is not None else 0


def xl_trim(text):
    return " ".join(str(text).split()) if text is not None else ""


def xl_upper(text):
    return str(text).upper() if text is not None else ""


def xl_lower(text):
    return str(text).lower() if text is not None else ""


def xl_concatenate(*args):
    return "".join(str(a) if a is not None else "" for a in args)


def xl_text(value, format_text):
    fmt = str(format_text)
    if isinstance(value, (int, float)):
        if "%" in fmt:
            return f"{value:.2%}"
        if "." in fmt:
            decimals = len(fmt.split(".")[-1].rstrip("0#")) or 2
            return f"{value:.{decimals}f}"
    return str(value)


def xl_value(text):
    try:
        return float(str(text).replace(",", ""))
    except (ValueError, TypeError):
        return 0


def xl_find(find_text, within_text, start_num=1):
    pos = str(within_text).find(str(find_text), int(_to_num(start_num)) - 1)
    return pos + 1 if pos >= 0 else None


def xl_search(find_text, within_text, start_num=1):
    pos = str(within_text).lower().find(str(find_text).lower(),
                                        int(_to_num(start_num)) - 1)
    return pos + 1 if pos >= 0 else None


def xl_substitute(text, old_text, new_text, instance_num=None):
    s = str(text)
    if instance_num is None:
        return s.replace(str(old_text), str(new_text))
    n = int(_to_num(instance_num))
    pos = -1
    for _ in range(n):
        pos = s.find(str(old_text), pos + 1)
        if pos < 0:
            return s
    return s[:pos] + str(new_text) + s[pos + len(str(old_text)):]


def xl_replace(old_text, start_num, num_chars, new_text):
    s = str(old_text)
    start = int(_to_num(start_num)) - 1
    return s[:start] + str(new_text) + s[start + int(_to_num(num_chars)):]


# ---- dates ----

def xl_today():
    return datetime.date.today()


def xl_now():
    return datetime.datetime.now()


def xl_year(d):
    return d.year if isinstance(d, (datetime.date, datetime.datetime)) else 0


def xl_month(d):
    return d.month if isinstance(d, (datetime.date, datetime.datetime)) else 0


def xl_day(d):
    return d.day if isinstance(d, (datetime.date, datetime.datetime)) else 0


def xl_date(year, month, day):
    return datetime.date(int(_to_num(year)), int(_to_num(month)), int(_to_num(day)))


def _shift_month(d, months):
    import calendar
    m = d.month + int(_to_num(months))
    y = d.year + (m - 1) // 12
    m = (m - 1) % 12 + 1
    return y, m, calendar.monthrange(y, m)[1]


def xl_eomonth(start_date, months):
    if not isinstance(start_date, (datetime.date, datetime.datetime)):
        return start_date
    y, m, last = _shift_month(start_date, months)
    return datetime.date(y, m, last)


def xl_edate(start_date, months):
    if not isinstance(start_date, (datetime.date, datetime.datetime)):
        return start_date
    y, m, last = _shift_month(start_date, months)
    return datetime.date(y, m, min(start_date.day, last))


def xl_datedif(start, end, unit):
    if not (isinstance(start, (datetime.date, datetime.datetime))
            and isinstance(end, (datetime.date, datetime.datetime))):
        return 0
    u = str(unit).upper()
    if u == "D":
        return (end - start).days
    if u == "M":
        return (end.year - start.year) * 12 + end.month - start.month
    if u == "Y":
        return end.year - start.year
    return 0


def xl_days(end_date, start_date):
    if (isinstance(end_date, (datetime.date, datetime.datetime))
            and isinstance(start_date, (datetime.date, datetime.datetime))):
        return (end_date - start_date).days
    return _to_num(end_date) - _to_num(start_date)


# ---- conditional aggregates ----

def xl_sumif(criteria_range, criteria, sum_range=None):
    cr = _flatten([criteria_range])
    sr = _flatten([sum_range]) if sum_range is not None else cr
    return sum(_to_num(sr[i]) for i, v in enumerate(cr)
               if _match_criteria(v, criteria) and i < len(sr))


def _ifs_mask(pairs):
    if not pairs:
        return []
    n = len(_flatten([pairs[0][0]]))
    mask = [True] * n
    for crit_range, criteria in pairs:
        cr = _flatten([crit_range])
        for i in range(n):
            if i >= len(cr) or not _match_criteria(cr[i], criteria):
                mask[i] = False
    return mask


def xl_sumifs(sum_range, *args):
    sr = _flatten([sum_range])
    mask = _ifs_mask(list(zip(args[::2], args[1::2])))
    return sum(_to_num(sr[i]) for i in range(min(len(sr), len(mask))) if mask[i])


def xl_countif(criteria_range, criteria):
    return sum(1 for v in _flatten([criteria_range]) if _match_criteria(v, criteria))


def xl_countifs(*args):
    return sum(1 for keep in _ifs_mask(list(zip(args[::2], args[1::2]))) if keep)


def xl_averageif(criteria_range, criteria, avg_range=None):
    cr = _flatten([criteria_range])
    ar = _flatten([avg_range]) if avg_range is not None else cr
    vals = [_to_num(ar[i]) for i, v in enumerate(cr)
            if _match_criteria(v, criteria) and i < len(ar)]
    return sum(vals) / len(vals) if vals else 0


def xl_averageifs(avg_range, *args):
    ar = _flatten([avg_range])
    mask = _ifs_mask(list(zip(args[::2], args[1::2])))
    vals = [_to_num(ar[i]) for i in range(min(len(ar), len(mask))) if mask[i]]
    return sum(vals) / len(vals) if vals else 0


def xl_maxifs(max_range, *args):
    mr = _flatten([max_range])
    mask = _ifs_mask(list(zip(args[::2], args[1::2])))
    vals = [_to_num(mr[i]) for i in range(min(len(mr), len(mask))) if mask[i]]
    return max(vals) if vals else 0


def xl_minifs(min_range, *args):
    mr = _flatten([min_range])
    mask = _ifs_mask(list(zip(args[::2], args[1::2])))
    vals = [_to_num(mr[i]) for i in range(min(len(mr), len(mask))) if mask[i]]
    return min(vals) if vals else 0


def xl_large(array, k):
    vals = sorted((_to_num(v) for v in _flatten([array]) if v is not None), reverse=True)
    i = int(_to_num(k)) - 1
    return vals[i] if 0 <= i < len(vals) else None


def xl_small(array, k):
    vals = sorted(_to_num(v) for v in _flatten([array]) if v is not None)
    i = int(_to_num(k)) - 1
    return vals[i] if 0 <= i < len(vals) else None


# ---- financial ----

def xl_npv(rate, *cashflows):
    r = _to_num(rate)
    return sum(_to_num(cf) / (1 + r) ** (i + 1)
               for i, cf in enumerate(_flatten(cashflows)))


def xl_irr(cashflows, guess=0.1):
    flows = [_to_num(v) for v in _flatten([cashflows])]
    rate = _to_num(guess)
    for _ in range(100):
        npv = sum(cf / (1 + rate) ** i for i, cf in enumerate(flows))
        d = sum(-i * cf / (1 + rate) ** (i + 1) for i, cf in enumerate(flows))
        if abs(d) < 1e-12:
            break
        step = npv / d
        rate -= step
        if abs(step) < 1e-9:
            return rate
    return rate


def xl_xnpv(rate, cashflows, dates):
    r = _to_num(rate)
    flows = _flatten([cashflows])
    ds = _flatten([dates])
    if not flows or not ds:
        return 0
    d0 = ds[0]
    return sum(_to_num(cf) / (1 + r) ** ((d - d0).days / 365.0)
               for cf, d in zip(flows, ds))


def xl_xirr(cashflows, dates, guess=0.1):
    rate = _to_num(guess)
    for _ in range(100):
        npv = xl_xnpv(rate, cashflows, dates)
        bump = xl_xnpv(rate + 1e-6, cashflows, dates)
        d = (bump - npv) / 1e-6
        if abs(d) < 1e-12:
            break
        step = npv / d
        rate -= step
        if abs(step) < 1e-9:
            return rate
    return rate


def xl_pmt(rate, nper, pv, fv=0, payment_type=0):
    r, n = _to_num(rate), _to_num(nper)
    if r == 0:
        return -(_to_num(pv) + _to_num(fv)) / n
    factor = (1 + r) ** n
    pmt = -r * (_to_num(pv) * factor + _to_num(fv)) / (factor - 1)
    if payment_type:
        pmt /= 1 + r
    return pmt


def xl_ppmt(rate, per, nper, pv, fv=0, payment_type=0):
    return (xl_pmt(rate, nper, pv, fv, payment_type)
            - xl_ipmt(rate, per, nper, pv, fv, payment_type))


def xl_ipmt(rate, per, nper, pv, fv=0, payment_type=0):
    r = _to_num(rate)
    pmt = xl_pmt(rate, nper, pv, fv, payment_type)
    balance = _to_num(pv)
    interest = 0
    for _ in range(int(_to_num(per))):
        interest = -balance * r
        balance += pmt - interest
    return interest


def xl_pv(rate, nper, pmt, fv=0, payment_type=0):
    r, n = _to_num(rate), _to_num(nper)
    if r == 0:
        return -(_to_num(pmt) * n + _to_num(fv))
    factor = (1 + r) ** n
    p = _to_num(pmt) * (1 + r * payment_type)
    return -(p * (factor - 1) / r + _to_num(fv)) / factor


def xl_fv(rate, nper, pmt, pv=0, payment_type=0):
    r, n = _to_num(rate), _to_num(nper)
    if r == 0:
        return -(_to_num(pv) + _to_num(pmt) * n)
    factor = (1 + r) ** n
    p = _to_num(pmt) * (1 + r * payment_type)
    return -(_to_num(pv) * factor + p * (factor - 1) / r)


def xl_nper(rate, pmt, pv, fv=0, payment_type=0):
    r = _to_num(rate)
    if r == 0:
        return -(_to_num(pv) + _to_num(fv)) / _to_num(pmt)
    p = _to_num(pmt) * (1 + r * payment_type)
    return math.log((p - _to_num(fv) * r) / (p + _to_num(pv) * r)) / math.log(1 + r)


def xl_rate(nper, pmt, pv, fv=0, payment_type=0, guess=0.1):
    rate = _to_num(guess)
    for _ in range(100):
        f = xl_fv(rate, nper, pmt, pv, payment_type) - _to_num(fv)
        bump = xl_fv(rate + 1e-6, nper, pmt, pv, payment_type) - _to_num(fv)
        d = (bump - f) / 1e-6
        if abs(d) < 1e-12:
            break
        step = f / d
        rate -= step
        if abs(step) < 1e-9:
            return rate
    return rate
"#;
